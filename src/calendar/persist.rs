use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use super::event::Event;

/// Storage key of the event map; also the JSON file stem.
pub const EVENTS_KEY: &str = "bg_calendar_events_v1";

pub type EventMap = BTreeMap<NaiveDate, Vec<Event>>;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Where the event map lives between sessions.
pub trait Backend {
    fn load(&self) -> PersistResult<EventMap>;
    fn save(&self, events: &EventMap) -> PersistResult<()>;

    /// Move state that failed to load out of the way of the next save.
    /// Returns where it went, or `None` when the backend cannot do that.
    fn quarantine(&self) -> PersistResult<Option<PathBuf>> {
        Ok(None)
    }
}

/// JSON document at `<dir>/<EVENTS_KEY>.json`.
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{EVENTS_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Backend for JsonFile {
    fn load(&self) -> PersistResult<EventMap> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EventMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if raw.trim().is_empty() {
            return Ok(EventMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, events: &EventMap) -> PersistResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let body = serde_json::to_string_pretty(events)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }

    /// Rename the file to `<name>.corrupt`, or `<name>.corrupt.N` if that is taken.
    fn quarantine(&self) -> PersistResult<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut target = self.path.with_extension("json.corrupt");
        let mut n = 1;
        while target.exists() {
            target = self.path.with_extension(format!("json.corrupt.{n}"));
            n += 1;
        }
        fs::rename(&self.path, &target).map_err(|e| self.io_err(e))?;
        Ok(Some(target))
    }
}

/// In-process backend; keeps the last saved snapshot.
#[derive(Default)]
pub struct Memory {
    saved: RefCell<EventMap>,
}

impl Memory {
    #[cfg(test)]
    pub fn with(events: EventMap) -> Self {
        Self {
            saved: RefCell::new(events),
        }
    }
}

impl Backend for Memory {
    fn load(&self) -> PersistResult<EventMap> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, events: &EventMap) -> PersistResult<()> {
        *self.saved.borrow_mut() = events.clone();
        Ok(())
    }
}
