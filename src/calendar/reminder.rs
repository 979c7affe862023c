use chrono::{Duration, NaiveDateTime};

use super::event::{Event, Kind};
use super::store::Store;

/// Reminders further out than this are not scheduled.
const HORIZON_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub event_id: String,
    pub title: String,
    pub kind: Kind,
    pub starts_at: NaiveDateTime,
    pub fire_at: NaiveDateTime,
}

impl Reminder {
    /// Schedule for a user record, if it wants one and it falls inside the
    /// horizon relative to `now`.
    pub fn for_event(event: &Event, now: NaiveDateTime) -> Option<Self> {
        if event.auto || !event.reminder_enabled {
            return None;
        }
        let starts_at = event.date.and_time(event.start?);
        let fire_at = starts_at - Duration::minutes(i64::from(event.reminder_minutes));
        let delay = fire_at - now;
        if delay <= Duration::zero() || delay > Duration::days(HORIZON_DAYS) {
            return None;
        }
        Some(Self {
            event_id: event.id.clone(),
            title: event.title.clone(),
            kind: event.kind,
            starts_at,
            fire_at,
        })
    }

    pub fn body(&self) -> String {
        format!("{} at {}", self.kind.label(), self.starts_at.format("%H:%M"))
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.fire_at <= now
    }
}

/// All schedulable reminders, soonest first.
pub fn upcoming(store: &Store, now: NaiveDateTime) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = store
        .user_events()
        .filter_map(|e| Reminder::for_event(e, now))
        .collect();
    reminders.sort_by_key(|r| r.fire_at);
    reminders
}

/// Remove and return the reminders whose time has come.
pub fn take_due(pending: &mut Vec<Reminder>, now: NaiveDateTime) -> Vec<Reminder> {
    let (due, rest): (Vec<_>, Vec<_>) = pending.drain(..).partition(|r| r.is_due(now));
    *pending = rest;
    due
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn at(date: &str, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn event(date: &str, start: Option<(u32, u32)>, minutes: u32) -> Event {
        let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        let mut ev = Event::new("Doctor", d);
        ev.start = start.map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap());
        ev.reminder_enabled = true;
        ev.reminder_minutes = minutes;
        ev
    }

    #[test]
    fn fires_minutes_before_start() {
        let ev = event("2024-03-05", Some((10, 0)), 30);
        let r = Reminder::for_event(&ev, at("2024-03-05", 8, 0)).unwrap();
        assert_eq!(r.fire_at, at("2024-03-05", 9, 30));
        assert_eq!(r.body(), "Event at 10:00");
    }

    #[test]
    fn skips_past_far_untimed_and_disabled() {
        let now = at("2024-03-05", 8, 0);
        assert!(Reminder::for_event(&event("2024-03-05", Some((8, 30)), 60), now).is_none());
        assert!(Reminder::for_event(&event("2024-03-20", Some((8, 30)), 60), now).is_none());
        assert!(Reminder::for_event(&event("2024-03-06", None, 60), now).is_none());

        let mut off = event("2024-03-06", Some((9, 0)), 60);
        off.reminder_enabled = false;
        assert!(Reminder::for_event(&off, now).is_none());
    }

    #[test]
    fn upcoming_is_sorted_and_due_ones_are_taken() {
        let mut store = Store::in_memory();
        store.add_or_update(event("2024-03-06", Some((9, 0)), 60));
        store.add_or_update(event("2024-03-05", Some((12, 0)), 15));
        let mut pending = upcoming(&store, at("2024-03-05", 8, 0));
        assert_eq!(pending.len(), 2);
        assert!(pending[0].fire_at < pending[1].fire_at);

        let due = take_due(&mut pending, at("2024-03-05", 11, 50));
        assert_eq!(due.len(), 1);
        assert_eq!(pending.len(), 1);
    }
}
