//! Free-time gaps within a single day.
//!
//! Busy spans come from records that carry both a start and an end. They are
//! merged (touching spans merge too) and the complement over `00:00..=23:59`
//! is returned.

use std::fmt;

use chrono::{NaiveTime, Timelike};

use super::event::Event;

/// Last minute of the day, 23:59.
pub const LAST_MINUTE: u32 = 24 * 60 - 1;

/// A span of minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl FreeInterval {
    fn from_minutes(start: u32, end: u32) -> Self {
        Self {
            start: from_minute(start),
            end: from_minute(end),
        }
    }

    pub fn minutes(&self) -> u32 {
        to_minute(self.end).saturating_sub(to_minute(self.start))
    }
}

impl fmt::Display for FreeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}–{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

fn to_minute(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

fn from_minute(m: u32) -> NaiveTime {
    let m = m.min(LAST_MINUTE);
    NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap_or_default()
}

/// Merged busy spans, ascending.
pub fn busy_intervals<'a, I>(events: I) -> Vec<Span>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut spans: Vec<Span> = events
        .into_iter()
        .filter_map(Event::time_range)
        .map(|(start, end)| Span {
            start: to_minute(start),
            end: to_minute(end),
        })
        .collect();
    // stable: equal starts keep their input order
    spans.sort_by_key(|s| s.start);

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(run) if span.start <= run.end => run.end = run.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Free intervals of the day not covered by any timed record.
pub fn free_time<'a, I>(events: I) -> Vec<FreeInterval>
where
    I: IntoIterator<Item = &'a Event>,
{
    let busy = busy_intervals(events);
    if busy.is_empty() {
        return vec![FreeInterval::from_minutes(0, LAST_MINUTE)];
    }

    let mut free = Vec::new();
    let mut prev_end = 0;
    for span in busy {
        if span.start > prev_end {
            free.push(FreeInterval::from_minutes(prev_end, span.start));
        }
        prev_end = prev_end.max(span.end);
    }
    if prev_end < LAST_MINUTE {
        free.push(FreeInterval::from_minutes(prev_end, LAST_MINUTE));
    }
    free
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::calendar::event::AutoType;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn timed(start: (u32, u32), end: (u32, u32)) -> Event {
        let d = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        Event::new("x", d).with_times(hm(start.0, start.1), hm(end.0, end.1))
    }

    fn untimed() -> Event {
        Event::new("errand", NaiveDate::from_ymd_opt(2024, 3, 3).unwrap())
    }

    fn render(free: &[FreeInterval]) -> Vec<String> {
        free.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_day_is_entirely_free() {
        assert_eq!(render(&free_time(&[] as &[Event])), ["00:00–23:59"]);
    }

    #[test]
    fn untimed_records_do_not_occupy_time() {
        let mut half = untimed();
        half.start = Some(hm(10, 0));
        let events = [untimed(), half];
        assert_eq!(render(&free_time(&events)), ["00:00–23:59"]);
    }

    #[test]
    fn touching_intervals_merge() {
        let events = [
            timed((9, 0), (10, 0)),
            timed((10, 0), (11, 30)),
            timed((14, 0), (15, 0)),
        ];
        let busy = busy_intervals(&events);
        assert_eq!(
            busy,
            [Span { start: 540, end: 690 }, Span { start: 840, end: 900 }]
        );
        assert_eq!(
            render(&free_time(&events)),
            ["00:00–09:00", "11:30–14:00", "15:00–23:59"]
        );
    }

    #[test]
    fn overlapping_intervals_merge() {
        let events = [timed((9, 30), (11, 0)), timed((9, 0), (10, 0))];
        assert_eq!(busy_intervals(&events), [Span { start: 540, end: 660 }]);
        assert_eq!(render(&free_time(&events)), ["00:00–09:00", "11:00–23:59"]);
    }

    #[test]
    fn contained_interval_does_not_shrink_run() {
        let events = [timed((8, 0), (17, 0)), timed((9, 0), (10, 0))];
        assert_eq!(render(&free_time(&events)), ["00:00–08:00", "17:00–23:59"]);
    }

    #[test]
    fn day_edges() {
        let events = [timed((0, 0), (1, 0)), timed((22, 0), (23, 59))];
        assert_eq!(render(&free_time(&events)), ["01:00–22:00"]);
    }

    #[test]
    fn weekday_auto_blocks() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let events = [
            Event::auto(AutoType::Work, d),
            Event::auto(AutoType::Food, d),
        ];
        let free = free_time(&events);
        assert_eq!(render(&free), ["00:00–08:00", "18:30–23:59"]);
        assert_eq!(free[0].minutes(), 480);
    }

    #[test]
    fn free_and_busy_partition_the_day() {
        let events = [
            timed((6, 15), (7, 0)),
            timed((6, 45), (9, 10)),
            timed((12, 0), (12, 0)),
            timed((13, 5), (18, 40)),
            timed((18, 40), (19, 0)),
            timed((21, 0), (21, 30)),
        ];
        let busy = busy_intervals(&events);
        let free = free_time(&events);

        let mut cuts: Vec<(u32, u32, bool)> = busy.iter().map(|s| (s.start, s.end, true)).collect();
        cuts.extend(free.iter().map(|f| (to_minute(f.start), to_minute(f.end), false)));
        cuts.sort();

        assert_eq!(cuts.first().unwrap().0, 0);
        assert_eq!(cuts.last().unwrap().1, LAST_MINUTE);
        for pair in cuts.windows(2) {
            assert_eq!(pair[0].1, pair[1].0, "gap or overlap at {:?}", pair);
        }
        for pair in free.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
