//! Current conditions from OpenWeatherMap.

use log::{debug, error};
use serde::Deserialize;

use crate::config::Settings;
use crate::http::{self, FetchResult};

const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weather {
    pub main: String,
    pub description: String,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<u8>,
    pub wind_speed: Option<f64>,
}

impl Weather {
    pub fn emoji(&self) -> &'static str {
        let text = if self.description.is_empty() {
            self.main.to_lowercase()
        } else {
            self.description.to_lowercase()
        };
        if text.contains("thunder") {
            "⛈️"
        } else if text.contains("snow") {
            "❄️"
        } else if text.contains("rain") || text.contains("shower") {
            "🌧️"
        } else if text.contains("drizzle") {
            "🌦️"
        } else if text.contains("cloud") {
            "☁️"
        } else if text.contains("mist") || text.contains("fog") {
            "🌫️"
        } else {
            "☀️"
        }
    }

    pub fn headline(&self) -> String {
        let temp = self
            .temp
            .map(|t| format!("  {}°", t.round()))
            .unwrap_or_default();
        format!("{} {}{}", self.emoji(), self.description, temp)
    }

    pub fn details(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(feels) = self.feels_like {
            out.push(format!("Feels like {}°", feels.round()));
        }
        if let Some(humidity) = self.humidity {
            out.push(format!("Humidity {humidity}%"));
        }
        if let Some(wind) = self.wind_speed {
            out.push(format!("Wind {wind:.1} m/s"));
        }
        out
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WeatherResponse {
    weather: Vec<Condition>,
    main: Option<Readings>,
    wind: Option<Wind>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Condition {
    main: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Readings {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Wind {
    speed: Option<f64>,
}

impl From<WeatherResponse> for Weather {
    fn from(resp: WeatherResponse) -> Self {
        let condition = resp.weather.into_iter().next().unwrap_or_default();
        let readings = resp.main.unwrap_or_default();
        Self {
            main: condition.main,
            description: condition.description,
            temp: readings.temp,
            feels_like: readings.feels_like,
            humidity: readings.humidity,
            wind_speed: resp.wind.and_then(|w| w.speed),
        }
    }
}

pub struct WeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
    lang: String,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, settings: &Settings) -> Self {
        Self {
            http,
            api_key: settings.weather_key().map(str::to_string),
            lang: settings.weather.lang.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current weather at a point. `None` when no key is configured or the
    /// request fails; failures are logged.
    pub async fn current(&self, lat: f64, lon: f64) -> Option<Weather> {
        let key = self.api_key.as_deref()?;
        match self.fetch(key, lat, lon).await {
            Ok(weather) => {
                debug!("weather: {}", weather.headline());
                Some(weather)
            }
            Err(e) => {
                error!("weather: fetch failed: {e}");
                None
            }
        }
    }

    async fn fetch(&self, key: &str, lat: f64, lon: f64) -> FetchResult<Weather> {
        let request = self.http.get(WEATHER_URL).query(&[
            ("lat", lat.to_string().as_str()),
            ("lon", lon.to_string().as_str()),
            ("appid", key),
            ("units", "metric"),
            ("lang", self.lang.as_str()),
        ]);
        let resp: WeatherResponse = http::get_json(request).await?;
        Ok(resp.into())
    }
}
