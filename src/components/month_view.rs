use chrono::{Datelike, Days, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::Store;
use crate::hebcal::{month_range, MonthMeta};
use crate::theme::Theme;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Tallest a week row gets: number, Hebrew day, markers.
const MAX_CELL_HEIGHT: u16 = 3;

pub struct MonthView;

impl MonthView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        selected_date: NaiveDate,
        today: NaiveDate,
        store: &Store,
        meta: Option<&MonthMeta>,
        theme: &Theme,
    ) {
        let year = selected_date.year();
        let month = selected_date.month();

        let block = Block::default()
            .title(format!(" {} ", selected_date.format("%B %Y")))
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some((grid_start, grid_end)) = visible_range(year, month) else {
            return;
        };
        let week_count = ((grid_end - grid_start).num_days() as usize + 1) / 7;

        let cell_h = (inner.height.saturating_sub(1) / week_count.max(1) as u16)
            .clamp(1, MAX_CELL_HEIGHT);

        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(std::iter::repeat_n(Constraint::Length(cell_h), week_count));
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        let columns = || Layout::horizontal([Constraint::Ratio(1, 7); 7]);

        for (col, name) in columns().split(rows[0]).iter().zip(DAY_NAMES) {
            let style = if name == "Sat" { theme.shabbat } else { theme.header };
            frame.render_widget(Paragraph::new(Span::styled(name, style)), *col);
        }

        let mut dates = grid_start.iter_days();
        for week in 0..week_count {
            let cells = columns().split(rows[week + 1]);
            for (cell, date) in cells.iter().zip(dates.by_ref()) {
                // metadata is per month; neighbouring days go without it
                let in_month = date.month() == month;
                let day_meta = meta.filter(|_| in_month);
                let lines =
                    day_cell(date, selected_date, today, store, day_meta, theme, cell_h, in_month);
                frame.render_widget(Paragraph::new(lines), *cell);
            }
        }
    }
}

/// First and last date shown on the grid for a month: whole Sunday-first
/// weeks, spilling into the neighbouring months.
pub fn visible_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let (first, last) = month_range(year, month)?;
    let leading = first.weekday().num_days_from_sunday();
    let trailing = 6 - last.weekday().num_days_from_sunday();
    Some((
        first.checked_sub_days(Days::new(leading.into()))?,
        last.checked_add_days(Days::new(trailing.into()))?,
    ))
}

#[allow(clippy::too_many_arguments)]
fn day_cell(
    date: NaiveDate,
    selected: NaiveDate,
    today: NaiveDate,
    store: &Store,
    meta: Option<&MonthMeta>,
    theme: &Theme,
    height: u16,
    in_month: bool,
) -> Vec<Line<'static>> {
    let number_style = if !in_month && date != today {
        theme.dim
    } else if date == today && date == selected {
        theme.today.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else if date == selected {
        theme.selected
    } else if date == today {
        theme.today
    } else {
        theme.text
    };

    let day_meta = meta.and_then(|m| m.day(date));
    let mut first = vec![Span::styled(format!("{:>2}", date.day()), number_style)];
    if store.is_busy(date) {
        first.push(Span::styled("!", theme.busy));
    }

    let mut markers: Vec<Span> = store
        .user_owners(date)
        .into_iter()
        .map(|owner| Span::styled("●", Style::default().fg(theme.owner_color(owner))))
        .collect();
    if let Some(day) = day_meta {
        if day.candles.is_some() || day.havdalah.is_some() {
            markers.push(Span::styled("✡", theme.shabbat));
        }
        if !day.holidays.is_empty() {
            markers.push(Span::styled("★", theme.holiday));
        }
    }

    let hebrew = meta
        .and_then(|m| m.hebrew_day(date))
        .map(|h| Span::styled(h.to_string(), theme.hebrew));

    if height == 1 {
        // compact: number, then the first owner dot only
        first.extend(markers.into_iter().take(1));
        return vec![Line::from(first)];
    }

    let mut lines = vec![Line::from(first)];
    match (height, hebrew) {
        (2, _) => lines.push(Line::from(markers)),
        (_, Some(h)) => {
            lines.push(Line::from(h));
            lines.push(Line::from(markers));
        }
        (_, None) => {
            lines.push(Line::from(""));
            lines.push(Line::from(markers));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn grid_spills_into_neighbouring_months() {
        // March 2024 starts on a Friday and ends on a Sunday.
        assert_eq!(
            visible_range(2024, 3),
            Some((date("2024-02-25"), date("2024-04-06")))
        );
    }

    #[test]
    fn month_starting_on_sunday_has_no_leading_days() {
        // September 2024 starts on a Sunday and ends on a Monday.
        assert_eq!(
            visible_range(2024, 9),
            Some((date("2024-09-01"), date("2024-10-05")))
        );
    }

    #[test]
    fn grid_is_whole_weeks() {
        for month in 1..=12 {
            let (start, end) = visible_range(2025, month).unwrap();
            assert_eq!(start.weekday(), chrono::Weekday::Sun);
            assert_eq!(((end - start).num_days() + 1) % 7, 0);
        }
    }
}
