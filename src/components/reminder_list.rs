use chrono::NaiveDateTime;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

use crate::calendar::Reminder;
use crate::theme::Theme;

use super::centered;

/// Popup of the reminders still waiting to fire, soonest first.
pub struct ReminderList;

impl ReminderList {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        reminders: &[Reminder],
        now: NaiveDateTime,
        theme: &Theme,
    ) {
        let popup_h = (reminders.len() as u16 + 4).clamp(6, 20);
        let popup_area = centered(area, 56, popup_h);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!(" Reminders ({}) ", reminders.len()))
            .title_style(theme.header)
            .title_bottom(Line::from(Span::styled(" Esc to close ", theme.dim)))
            .borders(Borders::ALL)
            .border_style(theme.border);

        if reminders.is_empty() {
            let items = vec![ListItem::new(Span::styled(
                "No reminders in the next 7 days",
                theme.dim,
            ))];
            frame.render_widget(List::new(items).block(block), popup_area);
            return;
        }

        let inner_w = popup_area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = reminders
            .iter()
            .map(|r| {
                let when = format!(" {} ", r.fire_at.format("%a %d/%m %H:%M"));
                let left = format!("in {}", until(r.fire_at, now));
                let budget = inner_w.saturating_sub(when.chars().count() + left.chars().count() + 2);
                ListItem::new(Line::from(vec![
                    Span::styled(when, theme.dim),
                    Span::styled(truncate(&r.title, budget), theme.text),
                    Span::styled(format!("  {left}"), theme.dim),
                ]))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), popup_area);
    }
}

/// Compact "2d 3h" / "45m" distance to `at`.
fn until(at: NaiveDateTime, now: NaiveDateTime) -> String {
    let minutes = (at - now).num_minutes().max(0);
    let (days, hours, mins) = (minutes / 1440, minutes % 1440 / 60, minutes % 60);
    match (days, hours) {
        (0, 0) => format!("{mins}m"),
        (0, h) => format!("{h}h {mins}m"),
        (d, h) => format!("{d}d {h}h"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    #[test]
    fn distance_formats() {
        let now = at(9, 0, 8);
        assert_eq!(until(at(9, 45, 8), now), "45m");
        assert_eq!(until(at(12, 5, 8), now), "3h 5m");
        assert_eq!(until(at(11, 0, 10), now), "2d 2h");
        assert_eq!(until(at(8, 0, 8), now), "0m");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("ארוחת ערב", 6), "ארו...");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
