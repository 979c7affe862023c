//! Hebrew dates, Shabbat times and holidays from hebcal.com.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};
use log::debug;
use serde::Deserialize;

use crate::config::City;
use crate::http::{self, FetchResult};

const CONVERTER_URL: &str = "https://www.hebcal.com/converter";
const CALENDAR_URL: &str = "https://www.hebcal.com/hebcal";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayMeta {
    pub candles: Option<NaiveTime>,
    pub havdalah: Option<NaiveTime>,
    pub holidays: Vec<String>,
}

/// Everything shown on the grid for one Gregorian month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthMeta {
    /// Day of month -> Hebrew day numeral.
    pub hebrew_days: BTreeMap<u32, String>,
    pub days: BTreeMap<NaiveDate, DayMeta>,
}

impl MonthMeta {
    pub fn hebrew_day(&self, date: NaiveDate) -> Option<&str> {
        self.hebrew_days.get(&date.day()).map(String::as_str)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayMeta> {
        self.days.get(&date)
    }

    pub fn from_responses(
        year: i32,
        month: u32,
        conv: ConverterResponse,
        cal: CalendarResponse,
    ) -> Self {
        let mut meta = MonthMeta::default();

        let dated = conv
            .items
            .into_iter()
            .map(|item| (item.date, item.hebrew))
            .chain(conv.hdates.into_iter().map(|(date, h)| (Some(date), h.hebrew)));
        for (date, hebrew) in dated {
            let (Some(date), Some(hebrew)) = (date, hebrew) else {
                continue;
            };
            let Some(date) = parse_date(&date) else {
                continue;
            };
            if date.year() != year || date.month() != month {
                continue;
            }
            let numeral = hebrew.split_whitespace().next().unwrap_or(&hebrew);
            meta.hebrew_days.insert(date.day(), numeral.to_string());
        }

        for item in cal.items {
            let (Some(date), Some(category)) = (item.date, item.category) else {
                continue;
            };
            let Some(day) = parse_date(&date) else {
                continue;
            };
            let entry = meta.days.entry(day).or_default();
            match category.as_str() {
                "candles" => entry.candles = parse_clock(&date),
                "havdalah" => entry.havdalah = parse_clock(&date),
                "holiday" | "chag" => entry.holidays.extend(item.title),
                _ => {}
            }
        }
        meta.days.retain(|_, d| *d != DayMeta::default());
        meta
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConverterResponse {
    items: Vec<ConverterItem>,
    hdates: BTreeMap<String, HebrewDate>,
}

#[derive(Debug, Deserialize)]
struct ConverterItem {
    date: Option<String>,
    hebrew: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HebrewDate {
    hebrew: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CalendarResponse {
    items: Vec<CalendarItem>,
}

#[derive(Debug, Deserialize)]
struct CalendarItem {
    title: Option<String>,
    date: Option<String>,
    category: Option<String>,
}

/// `YYYY-MM-DD` prefix of a date or timestamp.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Wall-clock time of an RFC 3339 timestamp, in its own offset.
fn parse_clock(raw: &str) -> Option<NaiveTime> {
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.time())
}

pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

pub struct HebcalClient {
    http: reqwest::Client,
}

impl HebcalClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch conversion and calendar data for a month; both requests run
    /// concurrently and both must succeed.
    pub async fn month(&self, year: i32, month: u32, city: &City) -> FetchResult<MonthMeta> {
        let Some((first, last)) = month_range(year, month) else {
            return Ok(MonthMeta::default());
        };
        let start = first.format("%Y-%m-%d").to_string();
        let end = last.format("%Y-%m-%d").to_string();

        let conv = self.http.get(CONVERTER_URL).query(&[
            ("cfg", "json"),
            ("g2h", "1"),
            ("start", start.as_str()),
            ("end", end.as_str()),
        ]);

        let latitude = city.lat.to_string();
        let longitude = city.lon.to_string();
        let cal = self.http.get(CALENDAR_URL).query(&[
            ("v", "1"),
            ("cfg", "json"),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("maj", "on"),
            ("min", "on"),
            ("mod", "on"),
            ("nx", "on"),
            ("ss", "on"),
            ("mf", "on"),
            ("c", "on"),
            ("geo", "pos"),
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("tzid", city.tzid.as_str()),
            ("M", "on"),
            ("s", "on"),
        ]);

        let (conv, cal) = tokio::try_join!(
            http::get_json::<ConverterResponse>(conv),
            http::get_json::<CalendarResponse>(cal),
        )?;
        let meta = MonthMeta::from_responses(year, month, conv, cal);
        debug!(
            "hebcal: {year}-{month:02} -> {} hebrew days, {} annotated days",
            meta.hebrew_days.len(),
            meta.days.len()
        );
        Ok(meta)
    }
}
