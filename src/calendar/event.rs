use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Event,
    Task,
}

impl Kind {
    pub fn label(self) -> &'static str {
        match self {
            Kind::Event => "Event",
            Kind::Task => "Task",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Kind::Event => Kind::Task,
            Kind::Task => Kind::Event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Benjamin,
    Nana,
    Both,
}

impl Owner {
    pub const ALL: [Owner; 3] = [Owner::Benjamin, Owner::Nana, Owner::Both];

    pub fn label(self) -> &'static str {
        match self {
            Owner::Benjamin => "Benjamin",
            Owner::Nana => "Nana",
            Owner::Both => "Shared",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Owner::Benjamin => Owner::Nana,
            Owner::Nana => Owner::Both,
            Owner::Both => Owner::Benjamin,
        }
    }
}

/// Tag of a synthetic weekday record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoType {
    Work,
    Food,
}

impl AutoType {
    pub fn as_str(self) -> &'static str {
        match self {
            AutoType::Work => "work",
            AutoType::Food => "food",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AutoType::Work => "Work",
            AutoType::Food => "Food & shower",
        }
    }

    /// Fixed `(start, end)` block of the day.
    pub fn window(self) -> (NaiveTime, NaiveTime) {
        match self {
            AutoType::Work => (hm(8, 0), hm(17, 0)),
            AutoType::Food => (hm(17, 0), hm(18, 30)),
        }
    }

    pub fn id_for(self, date: NaiveDate) -> String {
        format!("auto-{}-{}", self.as_str(), date.format("%Y-%m-%d"))
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// One event or task on a single day.
///
/// The serialized form uses camelCase keys, lowercase tags, `YYYY-MM-DD`
/// dates and `"HH:MM"` (or `""`) times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub auto: bool,
    #[serde(default)]
    pub auto_type: Option<AutoType>,
    pub kind: Kind,
    pub owner: Owner,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default, with = "hhmm")]
    pub start: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub end: Option<NaiveTime>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub reminder_enabled: bool,
    #[serde(
        default = "default_reminder_minutes",
        deserialize_with = "minutes_or_default"
    )]
    pub reminder_minutes: u32,
}

pub const DEFAULT_REMINDER_MINUTES: u32 = 60;

fn default_reminder_minutes() -> u32 {
    DEFAULT_REMINDER_MINUTES
}

/// A cleared minutes field was saved as `null`.
fn minutes_or_default<'de, D: serde::Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(d)?.unwrap_or(DEFAULT_REMINDER_MINUTES))
}

impl Event {
    /// A fresh user record with a random id.
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            auto: false,
            auto_type: None,
            kind: Kind::Event,
            owner: Owner::Benjamin,
            title: title.into(),
            date,
            start: None,
            end: None,
            address: String::new(),
            reminder_enabled: false,
            reminder_minutes: DEFAULT_REMINDER_MINUTES,
        }
    }

    pub fn auto(auto_type: AutoType, date: NaiveDate) -> Self {
        let (start, end) = auto_type.window();
        Self {
            id: auto_type.id_for(date),
            auto: true,
            auto_type: Some(auto_type),
            kind: Kind::Event,
            owner: Owner::Both,
            title: auto_type.title().to_string(),
            date,
            start: Some(start),
            end: Some(end),
            address: String::new(),
            reminder_enabled: false,
            reminder_minutes: DEFAULT_REMINDER_MINUTES,
        }
    }

    pub fn with_times(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Both ends present.
    pub fn time_range(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.start.zip(self.end)
    }

    pub fn duration_display(&self) -> String {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                format!("{}–{}", start.format("%H:%M"), end.format("%H:%M"))
            }
            (Some(start), None) => start.format("%H:%M").to_string(),
            _ => String::new(),
        }
    }

    pub fn waze_link(&self) -> Option<String> {
        if self.address.trim().is_empty() {
            return None;
        }
        url::Url::parse_with_params("https://waze.com/ul", &[("q", self.address.trim())])
            .ok()
            .map(String::from)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = self.duration_display();
        if when.is_empty() {
            write!(f, "{} {}", self.date, self.title)
        } else {
            write!(f, "{} {} {}", self.date, when, self.title)
        }
    }
}

pub fn new_id() -> String {
    format!("ev-{}", uuid::Uuid::new_v4().simple())
}

/// Parse a `"HH:MM"` string; empty input means "no time".
pub fn parse_time(s: &str) -> Result<Option<NaiveTime>, chrono::ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(s, "%H:%M").map(Some)
}

/// Serde adapter for `Option<NaiveTime>` stored as `"HH:MM"` or `""`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.collect_str(&t.format("%H:%M")),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        super::parse_time(&raw).map_err(de::Error::custom)
    }
}
