use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::calendar::event::{self, DEFAULT_REMINDER_MINUTES};
use crate::calendar::{Event, Kind, Owner};
use crate::theme::Theme;

use super::centered;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Date,
    StartTime,
    EndTime,
    Address,
    Kind,
    Owner,
    Reminder,
    ReminderMinutes,
}

impl FormField {
    const ORDER: [FormField; 9] = [
        FormField::Title,
        FormField::Date,
        FormField::StartTime,
        FormField::EndTime,
        FormField::Address,
        FormField::Kind,
        FormField::Owner,
        FormField::Reminder,
        FormField::ReminderMinutes,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    /// Fields edited by cycling a value instead of typing.
    pub fn is_choice(self) -> bool {
        matches!(self, FormField::Kind | FormField::Owner | FormField::Reminder)
    }
}

#[derive(Debug, Clone)]
pub struct EventFormState {
    /// Id of the record being edited; `None` for a new one.
    pub editing: Option<String>,
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub address: String,
    pub kind: Kind,
    pub owner: Owner,
    pub reminder_enabled: bool,
    pub reminder_minutes: String,
    pub active_field: FormField,
}

impl EventFormState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            editing: None,
            title: String::new(),
            date: date.format("%Y-%m-%d").to_string(),
            start_time: "18:00".to_string(),
            end_time: "19:00".to_string(),
            address: String::new(),
            kind: Kind::Event,
            owner: Owner::Benjamin,
            reminder_enabled: true,
            reminder_minutes: DEFAULT_REMINDER_MINUTES.to_string(),
            active_field: FormField::Title,
        }
    }

    pub fn from_event(event: &Event) -> Self {
        let hhmm = |t: Option<chrono::NaiveTime>| {
            t.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
        };
        Self {
            editing: Some(event.id.clone()),
            title: event.title.clone(),
            date: event.date.format("%Y-%m-%d").to_string(),
            start_time: hhmm(event.start),
            end_time: hhmm(event.end),
            address: event.address.clone(),
            kind: event.kind,
            owner: event.owner,
            reminder_enabled: event.reminder_enabled,
            reminder_minutes: event.reminder_minutes.to_string(),
            active_field: FormField::Title,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Validate the fields and build the record to store.
    pub fn to_event(&self) -> Result<Event, &'static str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required");
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| "Date must be YYYY-MM-DD")?;
        let start = event::parse_time(&self.start_time).map_err(|_| "Start must be HH:MM")?;
        let end = event::parse_time(&self.end_time).map_err(|_| "End must be HH:MM")?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err("End must not be before start");
            }
        }
        let reminder_minutes = match self.reminder_minutes.trim() {
            "" => DEFAULT_REMINDER_MINUTES,
            m => m.parse().map_err(|_| "Reminder minutes must be a number")?,
        };

        let mut event = Event::new(title, date);
        if let Some(id) = &self.editing {
            event.id = id.clone();
        }
        event.start = start;
        event.end = end;
        event.address = self.address.trim().to_string();
        event.kind = self.kind;
        event.owner = self.owner;
        event.reminder_enabled = self.reminder_enabled;
        event.reminder_minutes = reminder_minutes;
        Ok(event)
    }

    fn active_text(&mut self) -> Option<&mut String> {
        match self.active_field {
            FormField::Title => Some(&mut self.title),
            FormField::Date => Some(&mut self.date),
            FormField::StartTime => Some(&mut self.start_time),
            FormField::EndTime => Some(&mut self.end_time),
            FormField::Address => Some(&mut self.address),
            FormField::ReminderMinutes => Some(&mut self.reminder_minutes),
            FormField::Kind | FormField::Owner | FormField::Reminder => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.active_field.is_choice() {
            if c == ' ' {
                self.cycle_choice();
            }
            return;
        }
        if let Some(text) = self.active_text() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.active_text() {
            text.pop();
        }
    }

    pub fn cycle_choice(&mut self) {
        match self.active_field {
            FormField::Kind => self.kind = self.kind.toggle(),
            FormField::Owner => self.owner = self.owner.next(),
            FormField::Reminder => self.reminder_enabled = !self.reminder_enabled,
            _ => {}
        }
    }

    pub fn next_field(&mut self) {
        self.active_field = self.active_field.next();
    }

    pub fn prev_field(&mut self) {
        self.active_field = self.active_field.prev();
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState, theme: &Theme) {
        let form_area = centered(area, 54, 15);
        frame.render_widget(Clear, form_area);

        let title = if state.is_edit() { " Edit " } else { " New " };
        let accent = Style::default().fg(theme.owner_color(state.owner));
        let block = Block::default()
            .title(format!("{title}{} ", state.kind.label()))
            .title_style(accent.add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(accent);

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let mut constraints = vec![Constraint::Length(1); FormField::ORDER.len()];
        constraints.extend([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)]);
        let rows = Layout::vertical(constraints).split(inner);

        let reminder = if state.reminder_enabled { "[x] Remind me" } else { "[ ] Remind me" };
        let fields: [(FormField, &str, &str); 9] = [
            (FormField::Title, "Title:", &state.title),
            (FormField::Date, "Date:", &state.date),
            (FormField::StartTime, "Start:", &state.start_time),
            (FormField::EndTime, "End:", &state.end_time),
            (FormField::Address, "Where:", &state.address),
            (FormField::Kind, "Type:", state.kind.label()),
            (FormField::Owner, "Whose:", state.owner.label()),
            (FormField::Reminder, "", reminder),
            (FormField::ReminderMinutes, "Before:", &state.reminder_minutes),
        ];
        for (row, (field, label, value)) in rows.iter().zip(fields) {
            render_field(frame, *row, label, value, state.active_field == field, theme);
        }

        let key = Style::default().add_modifier(Modifier::BOLD);
        let help = Line::from(vec![
            Span::styled("Tab", key),
            Span::styled(":Next ", theme.dim),
            Span::styled("Space", key),
            Span::styled(":Cycle ", theme.dim),
            Span::styled("Enter", key),
            Span::styled(":Save ", theme.dim),
            Span::styled("Esc", key),
            Span::styled(":Cancel", theme.dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[FormField::ORDER.len() + 1]);
    }
}

fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    active: bool,
    theme: &Theme,
) {
    let cursor = if active { "_" } else { "" };
    let style = if active { theme.highlight } else { theme.text };

    let spans = vec![
        Span::styled(format!("{label:<8}"), theme.dim),
        Span::styled(format!("{value}{cursor}"), style),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn filled(title: &str) -> EventFormState {
        let mut form = EventFormState::new(date("2024-03-08"));
        form.title = title.to_string();
        form
    }

    #[test]
    fn defaults_build_an_evening_event() {
        let event = filled("  Dinner ").to_event().unwrap();
        assert_eq!(event.title, "Dinner");
        assert_eq!(event.start, NaiveTime::from_hms_opt(18, 0, 0));
        assert_eq!(event.end, NaiveTime::from_hms_opt(19, 0, 0));
        assert_eq!(event.owner, Owner::Benjamin);
        assert!(event.reminder_enabled);
        assert_eq!(event.reminder_minutes, 60);
        assert!(!event.auto);
    }

    #[test]
    fn validation_messages() {
        assert_eq!(filled(" ").to_event().unwrap_err(), "Title is required");

        let mut form = filled("x");
        form.date = "08/03/2024".into();
        assert_eq!(form.to_event().unwrap_err(), "Date must be YYYY-MM-DD");

        let mut form = filled("x");
        form.start_time = "25:00".into();
        assert_eq!(form.to_event().unwrap_err(), "Start must be HH:MM");

        let mut form = filled("x");
        form.start_time = "20:00".into();
        assert_eq!(form.to_event().unwrap_err(), "End must not be before start");

        let mut form = filled("x");
        form.reminder_minutes = "soon".into();
        assert_eq!(
            form.to_event().unwrap_err(),
            "Reminder minutes must be a number"
        );
    }

    #[test]
    fn blank_times_make_an_untimed_record() {
        let mut form = filled("Buy milk");
        form.start_time.clear();
        form.end_time.clear();
        form.kind = Kind::Task;
        let event = form.to_event().unwrap();
        assert_eq!(event.time_range(), None);
        assert_eq!(event.kind, Kind::Task);
    }

    #[test]
    fn editing_keeps_the_id() {
        let original = Event::new("Gym", date("2024-03-05"));
        let mut form = EventFormState::from_event(&original);
        assert!(form.is_edit());
        form.date = "2024-03-06".into();
        let updated = form.to_event().unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.date, date("2024-03-06"));
    }

    #[test]
    fn space_cycles_choice_fields_and_types_elsewhere() {
        let mut form = filled("a");
        form.input_char(' ');
        assert_eq!(form.title, "a ");

        form.active_field = FormField::Owner;
        form.input_char(' ');
        assert_eq!(form.owner, Owner::Nana);
        form.input_char('x');
        assert_eq!(form.owner, Owner::Nana);

        form.prev_field();
        assert_eq!(form.active_field, FormField::Kind);
        form.input_char(' ');
        assert_eq!(form.kind, Kind::Task);

        form.active_field = FormField::ReminderMinutes;
        form.next_field();
        assert_eq!(form.active_field, FormField::Title);
    }
}
