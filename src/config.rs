use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR: &str = "duo-calendar";
const CONFIG_FILE: &str = "config.toml";
pub const WEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not resolve a config directory")]
    NoConfigDir,

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("{} was unreadable at startup, not overwriting it", .0.display())]
    Unreadable(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

/// Location used for Shabbat times and weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub tzid: String,
}

impl Default for City {
    fn default() -> Self {
        Self {
            name: "Jerusalem, IL".to_string(),
            lat: 31.778,
            lon: 35.235,
            tzid: "Asia/Jerusalem".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub lang: String,
    /// From the environment; never written back to the file.
    #[serde(skip)]
    pub env_api_key: Option<String>,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            lang: "he".to_string(),
            env_api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: ThemeMode,
    pub log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub city: City,
    pub weather: WeatherSettings,
    /// File these settings were read from and are saved back to.
    #[serde(skip)]
    file: Option<PathBuf>,
    /// The file exists but failed to load; `save` leaves it alone.
    #[serde(skip)]
    file_unreadable: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::default(),
            log_level: "info".to_string(),
            data_dir: None,
            city: City::default(),
            weather: WeatherSettings::default(),
            file: None,
            file_unreadable: false,
        }
    }
}

impl Settings {
    /// Read the user config file, falling back to defaults. The returned
    /// error, if any, is for logging only: the environment key is applied
    /// either way.
    pub fn load_or_default() -> (Self, Option<ConfigError>) {
        let env_key = std::env::var(WEATHER_KEY_ENV).ok();
        match config_path() {
            Some(path) => Self::load_or_default_from(&path, env_key),
            None => {
                let mut settings = Self::default();
                settings.apply_env_key(env_key);
                (settings, Some(ConfigError::NoConfigDir))
            }
        }
    }

    pub fn load_or_default_from(
        path: &Path,
        env_key: Option<String>,
    ) -> (Self, Option<ConfigError>) {
        let (mut settings, err) = match Self::load_from(path) {
            Ok(settings) => (settings, None),
            Err(e) => {
                let settings = Self {
                    file_unreadable: true,
                    ..Self::default()
                };
                (settings, Some(e))
            }
        };
        settings.file = Some(path.to_path_buf());
        settings.apply_env_key(env_key);
        (settings, err)
    }

    /// Parse `path`. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Write back to the file these settings came from.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.file.as_deref().ok_or(ConfigError::NoConfigDir)?;
        if self.file_unreadable {
            return Err(ConfigError::Unreadable(path.to_path_buf()));
        }
        self.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = toml::to_string_pretty(self)?;
        std::fs::write(path, body).map_err(io_err)
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.weather.env_api_key = Some(key);
        }
    }

    /// Directory for the event file and logs.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
    }

    pub fn weather_key(&self) -> Option<&str> {
        let weather = &self.weather;
        weather
            .env_api_key
            .as_deref()
            .or(weather.api_key.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("none.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.city.tzid, "Asia/Jerusalem");
        assert_eq!(settings.weather.lang, "he");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            theme = "light"

            [city]
            name = "Haifa, IL"
            lat = 32.794
            lon = 34.989
            tzid = "Asia/Jerusalem"

            [weather]
            api_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(settings.theme, ThemeMode::Light);
        assert_eq!(settings.city.name, "Haifa, IL");
        assert_eq!(settings.weather_key(), Some("abc"));
        assert_eq!(settings.weather.lang, "he");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn bad_theme_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "theme = \"purple\"").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_round_trips_theme_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join(CONFIG_FILE);
        let mut settings = Settings::default();
        settings.theme = settings.theme.toggle();
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap().theme, ThemeMode::Light);
    }

    #[test]
    fn env_key_overrides_and_blank_keys_are_ignored() {
        let mut settings = Settings::default();
        settings.apply_env_key(Some("   ".to_string()));
        assert_eq!(settings.weather_key(), None);
        settings.apply_env_key(Some("k1".to_string()));
        assert_eq!(settings.weather_key(), Some("k1"));
    }

    #[test]
    fn unreadable_file_still_honours_env_key_and_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let original = "theme = \"purple\"\n[city]\nname = \"Haifa, IL\"\n";
        std::fs::write(&path, original).unwrap();

        let (mut settings, err) =
            Settings::load_or_default_from(&path, Some("from-env".to_string()));
        assert!(matches!(err, Some(ConfigError::Parse(_))));
        assert_eq!(settings.weather_key(), Some("from-env"));
        assert_eq!(settings.theme, ThemeMode::Dark);

        settings.theme = settings.theme.toggle();
        assert!(matches!(settings.save(), Err(ConfigError::Unreadable(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn save_writes_back_to_the_loaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let (mut settings, err) = Settings::load_or_default_from(&path, None);
        assert!(err.is_none());
        settings.city.name = "Tel Aviv, IL".to_string();
        settings.save().unwrap();
        assert_eq!(
            Settings::load_from(&path).unwrap().city.name,
            "Tel Aviv, IL"
        );
    }

    #[test]
    fn defaults_have_nowhere_to_save() {
        assert!(matches!(
            Settings::default().save(),
            Err(ConfigError::NoConfigDir)
        ));
    }

    #[test]
    fn env_key_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut settings = Settings::default();
        settings.apply_env_key(Some("secret".to_string()));
        settings.save_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));
        assert_eq!(Settings::load_from(&path).unwrap().weather_key(), None);
    }
}
