use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::calendar::{Event, FreeInterval};
use crate::theme::Theme;
use crate::weather::Weather;

use super::centered;

fn show(frame: &mut Frame, area: Rect, title: String, lines: Vec<Line>, theme: &Theme) {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(title)
        .title_style(theme.header)
        .title_bottom(Line::from(Span::styled(" Esc to close ", theme.dim)))
        .borders(Borders::ALL)
        .border_style(theme.border);
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(para, area);
}

pub fn render_free_time(
    frame: &mut Frame,
    area: Rect,
    date: NaiveDate,
    free: &[FreeInterval],
    theme: &Theme,
) {
    let lines: Vec<Line> = if free.is_empty() {
        vec![Line::from(Span::styled("No free time", theme.dim))]
    } else {
        free.iter()
            .map(|slot| {
                let minutes = slot.minutes();
                Line::from(vec![
                    Span::styled(format!(" {slot} "), theme.text),
                    Span::styled(format!(" {}h{:02}", minutes / 60, minutes % 60), theme.dim),
                ])
            })
            .collect()
    };
    let h = lines.len() as u16 + 2;
    show(
        frame,
        centered(area, 36, h.max(4)),
        format!(" Free · {} ", date.format("%a %d %b")),
        lines,
        theme,
    );
}

pub fn render_tasks(frame: &mut Frame, area: Rect, tasks: &[&Event], theme: &Theme) {
    let lines: Vec<Line> = if tasks.is_empty() {
        vec![Line::from(Span::styled("No tasks this month", theme.dim))]
    } else {
        tasks
            .iter()
            .map(|task| {
                Line::from(vec![
                    Span::styled(
                        "● ",
                        Style::default().fg(theme.owner_color(task.owner)),
                    ),
                    Span::styled(format!("{} ", task.date.format("%d/%m")), theme.dim),
                    Span::styled(
                        match task.duration_display() {
                            t if t.is_empty() => String::new(),
                            t => format!("{t} "),
                        },
                        theme.dim,
                    ),
                    Span::styled(task.title.clone(), theme.text),
                ])
            })
            .collect()
    };
    let h = (lines.len() as u16 + 2).clamp(4, 22);
    show(
        frame,
        centered(area, 56, h),
        format!(" Tasks ({}) ", tasks.len()),
        lines,
        theme,
    );
}

pub fn render_weather(
    frame: &mut Frame,
    area: Rect,
    date: NaiveDate,
    city: &str,
    report: Option<&Weather>,
    theme: &Theme,
) {
    let lines: Vec<Line> = match report {
        None => vec![Line::from(Span::styled("Weather unavailable", theme.dim))],
        Some(weather) => {
            let mut lines = vec![Line::from(Span::styled(weather.headline(), theme.header))];
            lines.extend(
                weather
                    .details()
                    .into_iter()
                    .map(|d| Line::from(Span::styled(d, theme.text))),
            );
            lines
        }
    };
    let h = lines.len() as u16 + 2;
    show(
        frame,
        centered(area, 40, h.max(4)),
        format!(" {city} · {} ", date.format("%a %d %b")),
        lines,
        theme,
    );
}

pub fn render_city_prompt(frame: &mut Frame, area: Rect, input: &str, theme: &Theme) {
    let lines = vec![
        Line::from(vec![
            Span::styled(input.to_string(), theme.text),
            Span::styled("█", theme.selected),
        ]),
        Line::from(Span::styled("Coordinates stay as configured", theme.dim)),
    ];
    show(frame, centered(area, 44, 4), " City ".to_string(), lines, theme);
}

const HELP: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("h/l ←/→", "Previous/next day"),
            ("K/J", "Previous/next week"),
            ("[/]", "Previous/next month"),
            ("j/k ↑/↓", "Move in day list"),
            ("t", "Jump to today"),
        ],
    ),
    (
        "Records",
        &[
            ("Enter", "Details"),
            ("n", "New event or task"),
            ("e", "Edit selected"),
            ("d", "Delete selected"),
        ],
    ),
    (
        "Views",
        &[
            ("f", "Free time for the day"),
            ("T", "Tasks for the coming month"),
            ("r", "Pending reminders"),
            ("w", "Current weather"),
            ("L", "Toggle light/dark"),
            ("c", "Rename city"),
        ],
    ),
];

pub fn render_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let key_style = theme.header;
    let section_style = theme.text.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut lines: Vec<Line> = Vec::new();
    for (section, keys) in HELP {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(*section, section_style)));
        for (key, desc) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<10}"), key_style),
                Span::styled(*desc, theme.text),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  q", key_style),
        Span::styled(" / ", theme.dim),
        Span::styled("Esc     ", key_style),
        Span::styled("Quit / close popup", theme.text),
    ]));

    let h = lines.len() as u16 + 2;
    show(frame, centered(area, 48, h), " Keybindings ".to_string(), lines, theme);
}
