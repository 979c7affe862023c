use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use log::{debug, error, info, warn};

use super::event::{AutoType, Event, Kind, Owner};
use super::persist::{Backend, EventMap, Memory};

/// Date-keyed event records plus the weekday auto-record overlay.
///
/// User records are persisted through the backend after every mutation.
/// Auto records are memoized in memory by [`Store::inject_auto_events`] and
/// merged in on read; they are never written out.
pub struct Store {
    events: EventMap,
    auto: BTreeMap<NaiveDate, Vec<Event>>,
    backend: Box<dyn Backend>,
    /// Set when unreadable state could not be moved aside; saving would
    /// destroy it.
    read_only: bool,
}

impl Store {
    /// Load from `backend`. A failed load yields an empty store; the
    /// unreadable state is quarantined, or saving is disabled if it cannot be.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let mut read_only = false;
        let mut events = match backend.load() {
            Ok(events) => events,
            Err(e) => {
                error!("events: failed to load persisted state: {e}");
                match backend.quarantine() {
                    Ok(Some(path)) => warn!("events: unreadable state moved to {}", path.display()),
                    Ok(None) => {
                        warn!("events: saving disabled for this session");
                        read_only = true;
                    }
                    Err(qe) => {
                        error!("events: could not move unreadable state aside: {qe}");
                        read_only = true;
                    }
                }
                EventMap::new()
            }
        };

        // Older data files carried the auto records inline.
        let mut dropped = 0;
        for list in events.values_mut() {
            let before = list.len();
            list.retain(|e| !e.auto);
            dropped += before - list.len();
        }
        events.retain(|_, list| !list.is_empty());
        if dropped > 0 {
            info!("events: dropped {dropped} persisted auto records");
        }

        Self {
            events,
            auto: BTreeMap::new(),
            backend,
            read_only,
        }
    }

    /// True when changes stay in memory only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(Memory::default()))
    }

    /// Records for `date`: auto records first (when requested and injected),
    /// then user records in insertion order.
    pub fn events_for_date(&self, date: NaiveDate, include_auto: bool) -> Vec<&Event> {
        let auto = self
            .auto
            .get(&date)
            .filter(|_| include_auto)
            .into_iter()
            .flatten();
        let user = self.events.get(&date).into_iter().flatten();
        auto.chain(user).collect()
    }

    /// Replace the record with the same id, or append it to its date.
    pub fn add_or_update(&mut self, event: Event) {
        if event.auto {
            warn!("events: refusing to store auto record {}", event.id);
            return;
        }

        // An edit may have moved the record to another day.
        for (date, list) in self.events.iter_mut() {
            if *date != event.date {
                list.retain(|e| e.id != event.id);
            }
        }
        self.events.retain(|_, list| !list.is_empty());

        let list = self.events.entry(event.date).or_default();
        match list.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => {
                debug!("events: updated {} ({event})", event.id);
                *slot = event;
            }
            None => {
                debug!("events: added {} ({event})", event.id);
                list.push(event);
            }
        }
        self.persist();
    }

    /// Remove the record `id` from `date`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str, date: NaiveDate) -> bool {
        let Some(list) = self.events.get_mut(&date) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| e.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.events.remove(&date);
        }
        if removed {
            debug!("events: deleted {id}");
            self.persist();
        }
        removed
    }

    /// Make sure the work and food records exist for a Sunday-Thursday date.
    pub fn inject_auto_events(&mut self, date: NaiveDate) {
        if !is_work_day(date) {
            return;
        }
        let list = self.auto.entry(date).or_default();
        for auto_type in [AutoType::Work, AutoType::Food] {
            if !list.iter().any(|e| e.auto_type == Some(auto_type)) {
                list.push(Event::auto(auto_type, date));
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<&Event> {
        self.user_events().find(|e| e.id == id)
    }

    pub fn user_events(&self) -> impl Iterator<Item = &Event> {
        self.events.values().flatten()
    }

    /// Distinct owners of the user records on `date`, in first-seen order.
    pub fn user_owners(&self, date: NaiveDate) -> Vec<Owner> {
        let mut owners = Vec::new();
        for ev in self.events_for_date(date, false) {
            if !owners.contains(&ev.owner) {
                owners.push(ev.owner);
            }
        }
        owners
    }

    pub fn is_busy(&self, date: NaiveDate) -> bool {
        self.events.get(&date).map_or(0, Vec::len) > 2
    }

    /// User tasks dated within `[from, to]`, ordered by date then start.
    pub fn tasks_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Event> {
        if from > to {
            return Vec::new();
        }
        let mut tasks: Vec<&Event> = self
            .events
            .range(from..=to)
            .flat_map(|(_, list)| list)
            .filter(|e| e.kind == Kind::Task)
            .collect();
        tasks.sort_by(|a, b| a.date.cmp(&b.date).then(a.start.cmp(&b.start)));
        tasks
    }

    fn persist(&self) {
        if self.read_only {
            debug!("events: read-only, not saving");
            return;
        }
        if let Err(e) = self.backend.save(&self.events) {
            error!("events: save failed, keeping in-memory state: {e}");
        }
    }
}

/// Sunday through Thursday.
pub fn is_work_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Fri | Weekday::Sat)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::NaiveTime;

    use super::super::persist::{PersistError, PersistResult};
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2024-03-03 is a Sunday.
    const SUNDAY: &str = "2024-03-03";
    const FRIDAY: &str = "2024-03-08";
    const SATURDAY: &str = "2024-03-09";

    #[test]
    fn empty_date_has_no_events() {
        let store = Store::in_memory();
        assert!(store.events_for_date(date(SUNDAY), true).is_empty());
    }

    #[test]
    fn add_appends_and_update_replaces_in_place() {
        let mut store = Store::in_memory();
        let d = date(SUNDAY);
        let first = Event::new("Gym", d);
        let second = Event::new("Call mom", d);
        store.add_or_update(first.clone());
        store.add_or_update(second);
        assert_eq!(store.events_for_date(d, false).len(), 2);

        let mut edited = first.clone();
        edited.title = "Gym (legs)".to_string();
        store.add_or_update(edited);

        let list = store.events_for_date(d, false);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, first.id);
        assert_eq!(list[0].title, "Gym (legs)");
    }

    #[test]
    fn moving_a_record_to_another_day_keeps_ids_unique() {
        let mut store = Store::in_memory();
        let mut ev = Event::new("Haircut", date(SUNDAY));
        store.add_or_update(ev.clone());
        ev.date = date("2024-03-04");
        store.add_or_update(ev.clone());

        assert!(store.events_for_date(date(SUNDAY), false).is_empty());
        assert_eq!(store.events_for_date(ev.date, false).len(), 1);
        assert_eq!(store.user_events().count(), 1);
    }

    #[test]
    fn delete_missing_id_is_a_noop() {
        let mut store = Store::in_memory();
        let d = date(SUNDAY);
        store.add_or_update(Event::new("Laundry", d));
        assert!(!store.delete("ev-nope", d));
        assert!(!store.delete("ev-nope", date(FRIDAY)));
        assert_eq!(store.events_for_date(d, false).len(), 1);
    }

    #[test]
    fn delete_removes_matching_record() {
        let mut store = Store::in_memory();
        let d = date(SUNDAY);
        let ev = Event::new("Laundry", d);
        store.add_or_update(ev.clone());
        assert!(store.delete(&ev.id, d));
        assert!(store.events_for_date(d, true).is_empty());
    }

    #[test]
    fn injection_is_idempotent() {
        let mut store = Store::in_memory();
        let d = date(SUNDAY);
        store.inject_auto_events(d);
        store.inject_auto_events(d);

        let list = store.events_for_date(d, true);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "auto-work-2024-03-03");
        assert_eq!(list[0].time_range(), Some((hm(8, 0), hm(17, 0))));
        assert_eq!(list[1].id, "auto-food-2024-03-03");
        assert_eq!(list[1].time_range(), Some((hm(17, 0), hm(18, 30))));
    }

    #[test]
    fn no_injection_on_friday_or_saturday() {
        let mut store = Store::in_memory();
        for d in [FRIDAY, SATURDAY] {
            store.inject_auto_events(date(d));
            assert!(store.events_for_date(date(d), true).is_empty());
        }
    }

    #[test]
    fn auto_records_are_filtered_and_never_persisted() {
        let backend = Memory::default();
        let shared = std::rc::Rc::new(backend);

        struct Shared(std::rc::Rc<Memory>);
        impl Backend for Shared {
            fn load(&self) -> PersistResult<EventMap> {
                self.0.load()
            }
            fn save(&self, events: &EventMap) -> PersistResult<()> {
                self.0.save(events)
            }
        }

        let mut store = Store::new(Box::new(Shared(shared.clone())));
        let d = date(SUNDAY);
        store.inject_auto_events(d);
        store.add_or_update(Event::new("Dinner out", d));

        assert_eq!(store.events_for_date(d, true).len(), 3);
        let user = store.events_for_date(d, false);
        assert_eq!(user.len(), 1);
        assert_eq!(user[0].title, "Dinner out");

        let saved = shared.load().unwrap();
        assert_eq!(saved[&d].len(), 1);
        assert!(saved[&d].iter().all(|e| !e.auto));
    }

    #[test]
    fn legacy_auto_records_are_dropped_on_load() {
        let d = date(SUNDAY);
        let mut legacy = EventMap::new();
        legacy.insert(
            d,
            vec![Event::auto(AutoType::Work, d), Event::new("Dentist", d)],
        );
        let mut store = Store::new(Box::new(Memory::with(legacy)));
        store.inject_auto_events(d);

        let list = store.events_for_date(d, true);
        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().filter(|e| e.auto).count(), 2);
    }

    #[test]
    fn save_failure_keeps_memory_state() {
        struct Broken(Cell<u32>);
        impl Backend for Broken {
            fn load(&self) -> PersistResult<EventMap> {
                Ok(EventMap::new())
            }
            fn save(&self, _: &EventMap) -> PersistResult<()> {
                self.0.set(self.0.get() + 1);
                Err(PersistError::Io {
                    path: "quota".into(),
                    source: std::io::Error::other("quota exceeded"),
                })
            }
        }

        let mut store = Store::new(Box::new(Broken(Cell::new(0))));
        let d = date(SUNDAY);
        store.add_or_update(Event::new("Still here", d));
        assert_eq!(store.events_for_date(d, false).len(), 1);
    }

    #[test]
    fn unreadable_file_is_moved_aside_before_the_next_save() {
        let dir = tempfile::tempdir().unwrap();
        let backend = super::super::persist::JsonFile::in_dir(dir.path());
        let path = backend.path().to_path_buf();
        let original = r#"{"2024-03-05": [{"id": "ev-1", "kind": "event", "owner": "nana",
            "title": "Dentist", "date": "2024-03-05", "start": "09:00", "end": "10:00",
            "reminderMinutes": "soon"}]}"#;
        std::fs::write(&path, original).unwrap();

        let mut store = Store::new(Box::new(backend));
        assert!(!store.is_read_only());
        assert_eq!(store.user_events().count(), 0);
        store.add_or_update(Event::new("New", date("2024-03-05")));

        let kept = std::fs::read_to_string(path.with_extension("json.corrupt")).unwrap();
        assert_eq!(kept, original);
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("\"New\""));
        assert!(!saved.contains("Dentist"));
    }

    #[test]
    fn null_minutes_from_older_files_load_normally() {
        let dir = tempfile::tempdir().unwrap();
        let backend = super::super::persist::JsonFile::in_dir(dir.path());
        let path = backend.path().to_path_buf();
        std::fs::write(
            &path,
            r#"{"2024-03-05": [
                {"id": "ev-1", "kind": "event", "owner": "nana", "title": "Dentist",
                 "date": "2024-03-05", "start": "09:00", "end": "10:00",
                 "reminderEnabled": true, "reminderMinutes": 30},
                {"id": "ev-2", "kind": "task", "owner": "both", "title": "Pharmacy",
                 "date": "2024-03-05", "start": "", "end": "",
                 "reminderEnabled": false, "reminderMinutes": null}
            ]}"#,
        )
        .unwrap();

        let mut store = Store::new(Box::new(backend));
        assert_eq!(store.events_for_date(date("2024-03-05"), false).len(), 2);
        store.add_or_update(Event::new("New", date("2024-03-05")));

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("Dentist") && saved.contains("Pharmacy"));
        assert!(!path.with_extension("json.corrupt").exists());
    }

    #[test]
    fn load_failure_without_quarantine_disables_saving() {
        struct Unreadable(std::rc::Rc<Cell<u32>>);
        impl Backend for Unreadable {
            fn load(&self) -> PersistResult<EventMap> {
                Err(PersistError::Io {
                    path: "events".into(),
                    source: std::io::Error::other("permission denied"),
                })
            }
            fn save(&self, _: &EventMap) -> PersistResult<()> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
        }

        let saves = std::rc::Rc::new(Cell::new(0));
        let mut store = Store::new(Box::new(Unreadable(saves.clone())));
        assert!(store.is_read_only());
        let d = date(SUNDAY);
        let ev = Event::new("Kept in memory", d);
        store.add_or_update(ev.clone());
        assert!(store.delete(&ev.id, d));
        assert_eq!(saves.get(), 0);
    }

    #[test]
    fn owners_and_busy_flag() {
        let mut store = Store::in_memory();
        let d = date(SUNDAY);
        store.inject_auto_events(d);
        for (title, owner) in [("a", Owner::Nana), ("b", Owner::Benjamin), ("c", Owner::Nana)] {
            let mut ev = Event::new(title, d);
            ev.owner = owner;
            store.add_or_update(ev);
        }
        assert_eq!(store.user_owners(d), vec![Owner::Nana, Owner::Benjamin]);
        assert!(store.is_busy(d));
        assert!(!store.is_busy(date(FRIDAY)));
    }

    #[test]
    fn tasks_between_sorts_by_date_then_start() {
        let mut store = Store::in_memory();
        let mut late = Event::new("Pay rent", date("2024-03-10")).with_times(hm(12, 0), hm(12, 30));
        late.kind = Kind::Task;
        let mut early = Event::new("Renew passport", date("2024-03-10")).with_times(hm(9, 0), hm(9, 30));
        early.kind = Kind::Task;
        let mut outside = Event::new("Taxes", date("2024-05-01"));
        outside.kind = Kind::Task;
        store.add_or_update(late);
        store.add_or_update(early);
        store.add_or_update(outside);
        store.add_or_update(Event::new("Not a task", date("2024-03-05")));

        let tasks = store.tasks_between(date(SUNDAY), date("2024-04-03"));
        let titles: Vec<_> = tasks.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Renew passport", "Pay rent"]);
    }
}
