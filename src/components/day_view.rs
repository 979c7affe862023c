use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::calendar::{Event, Kind};
use crate::hebcal::DayMeta;
use crate::theme::Theme;

use super::centered;

pub struct DayView;

impl DayView {
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        events: &[&Event],
        cursor: usize,
        hebrew: Option<&str>,
        meta: Option<&DayMeta>,
        theme: &Theme,
    ) {
        let w = area.width as usize;

        let mut title = if w >= 30 {
            format!(" {} ", date.format("%A, %B %d, %Y"))
        } else {
            format!(" {} ", date.format("%b %d"))
        };
        if let Some(h) = hebrew {
            title.push_str(&format!("· {h} "));
        }

        let user_count = events.iter().filter(|e| !e.auto).count();
        let count_str = match user_count {
            0 => String::new(),
            1 => " 1 item ".to_string(),
            n => format!(" {n} items "),
        };

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .title_bottom(Line::from(Span::styled(count_str, theme.dim)))
            .borders(Borders::ALL)
            .border_style(theme.border);

        let mut items: Vec<ListItem> = Vec::new();
        let mut header_rows = 0;
        if let Some(meta) = meta {
            for line in day_header(meta, theme) {
                items.push(ListItem::new(line));
                header_rows += 1;
            }
            if header_rows > 0 {
                items.push(ListItem::new(Line::from("")));
                header_rows += 1;
            }
        }

        if events.is_empty() {
            items.push(ListItem::new(Span::styled("Nothing planned", theme.dim)));
            frame.render_widget(List::new(items).block(block), area);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        items.extend(events.iter().map(|ev| format_event(ev, inner_w, theme)));

        let mut state = ListState::default().with_selected(Some(header_rows + cursor));
        let list = List::new(items)
            .block(block)
            .highlight_style(theme.highlight);
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Shabbat times and holiday names shown above the day's records.
fn day_header(meta: &DayMeta, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut times = Vec::new();
    if let Some(t) = meta.candles {
        times.push(format!("🕯 {}", t.format("%H:%M")));
    }
    if let Some(t) = meta.havdalah {
        times.push(format!("✨ {}", t.format("%H:%M")));
    }
    if !times.is_empty() {
        lines.push(Line::from(Span::styled(times.join("  "), theme.shabbat)));
    }
    for holiday in &meta.holidays {
        lines.push(Line::from(Span::styled(format!("★ {holiday}"), theme.holiday)));
    }
    lines
}

fn format_event(ev: &Event, max_width: usize, theme: &Theme) -> ListItem<'static> {
    let marker = Span::styled("▌", Style::default().fg(theme.owner_color(ev.owner)));

    let time_str = match ev.duration_display() {
        t if t.is_empty() => " ".repeat(12),
        t => format!(" {t:<11}"),
    };
    let time_span = Span::styled(time_str.clone(), theme.dim);

    let title_style = if ev.auto {
        theme.dim
    } else if ev.kind == Kind::Task {
        theme.text.add_modifier(Modifier::ITALIC)
    } else {
        theme.text
    };
    let mut spans = vec![marker, time_span, Span::styled(ev.title.clone(), title_style)];

    let tag = if ev.auto {
        " Fixed".to_string()
    } else {
        format!(" {} · {}", ev.owner.label(), ev.kind.label())
    };
    let used = 1 + time_str.chars().count() + ev.title.chars().count();
    if used + tag.chars().count() <= max_width {
        spans.push(Span::styled(tag, theme.dim));
    }
    if ev.reminder_enabled && !ev.auto {
        spans.push(Span::styled(" ⏰", theme.dim));
    }

    ListItem::new(Line::from(spans))
}

/// Render the detail popup for one record.
pub fn render_detail_popup(frame: &mut Frame, area: Rect, ev: &Event, theme: &Theme) {
    let popup_area = centered(area, 60, 14);
    frame.render_widget(Clear, popup_area);

    let accent = Style::default().fg(theme.owner_color(ev.owner));
    let block = Block::default()
        .title(format!(" {} ", ev.title))
        .title_style(accent.add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(accent);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, theme.dim),
            Span::styled(value, theme.text),
        ])
    };

    let mut lines = vec![
        field("Whose: ", ev.owner.label().to_string()),
        field("Type:  ", ev.kind.label().to_string()),
        Line::from(""),
        field("Date:  ", ev.date.format("%A, %B %d, %Y").to_string()),
    ];
    let when = ev.duration_display();
    lines.push(if when.is_empty() {
        Line::from(Span::styled("No time set", theme.dim))
    } else {
        field("Time:  ", when)
    });

    if ev.auto {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Fixed weekday block, not editable",
            theme.dim,
        )));
    }

    if let Some(link) = ev.waze_link() {
        lines.push(Line::from(""));
        lines.push(field("Where: ", ev.address.clone()));
        lines.push(field("Waze:  ", link));
    }

    if ev.reminder_enabled && !ev.auto {
        lines.push(field(
            "Remind:",
            format!(" {} min before", ev.reminder_minutes),
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Press Esc to close", theme.dim)));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    #[test]
    fn header_lists_times_then_holidays() {
        let meta = DayMeta {
            candles: NaiveTime::from_hms_opt(17, 12, 0),
            havdalah: None,
            holidays: vec!["Purim".to_string()],
        };
        let lines = day_header(&meta, &Theme::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].to_string(), "🕯 17:12");
        assert_eq!(lines[1].to_string(), "★ Purim");
    }

    #[test]
    fn empty_meta_adds_no_header() {
        assert!(day_header(&DayMeta::default(), &Theme::default()).is_empty());
    }
}
