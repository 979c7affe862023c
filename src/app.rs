use std::collections::HashMap;

use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime};
use log::{error, info, warn};

use crate::calendar::reminder::{self, Reminder};
use crate::calendar::{free_time, Event, FreeInterval, Store};
use crate::components::event_form::EventFormState;
use crate::components::month_view::visible_range;
use crate::config::Settings;
use crate::hebcal::{HebcalClient, MonthMeta};
use crate::theme::Theme;
use crate::weather::{Weather, WeatherClient};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
    City,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Popup {
    Detail(String),
    FreeTime(NaiveDate),
    Tasks,
    Reminders,
    Weather {
        date: NaiveDate,
        report: Option<Weather>,
    },
    Help,
}

pub struct App {
    pub running: bool,
    pub input_mode: InputMode,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    pub day_cursor: usize,
    pub form_state: Option<EventFormState>,
    pub city_input: String,
    pub popup: Option<Popup>,
    pub status_message: Option<String>,
    pub settings: Settings,
    pub theme: Theme,
    pub store: Store,
    pub pending_reminders: Vec<Reminder>,
    shown_month: (i32, u32),
    month_meta: HashMap<(i32, u32), MonthMeta>,
    hebcal: HebcalClient,
    weather: WeatherClient,
}

impl App {
    pub fn new(settings: Settings, store: Store, http: reqwest::Client) -> Self {
        let now = Local::now().naive_local();
        let today = now.date();
        let theme = Theme::load(settings.theme);
        let hebcal = HebcalClient::new(http.clone());
        let weather = WeatherClient::new(http, &settings);
        if !weather.is_configured() {
            info!("weather: no OpenWeather key configured");
        }

        let mut app = Self {
            running: true,
            input_mode: InputMode::Normal,
            selected_date: today,
            today,
            day_cursor: 0,
            form_state: None,
            city_input: String::new(),
            popup: None,
            status_message: None,
            settings,
            theme,
            store,
            pending_reminders: Vec::new(),
            shown_month: (today.year(), today.month()),
            month_meta: HashMap::new(),
            hebcal,
            weather,
        };
        if app.store.is_read_only() {
            app.status_message = Some("Event file unreadable, changes will not be saved".to_string());
        }
        app.reschedule_reminders(now);
        app.prepare_month();
        app
    }

    // ── Month data ──

    /// Inject the weekday auto records for every day on the month grid,
    /// neighbouring-month days included.
    fn prepare_month(&mut self) {
        let Some((first, last)) =
            visible_range(self.selected_date.year(), self.selected_date.month())
        else {
            return;
        };
        for date in first.iter_days().take_while(|d| *d <= last) {
            self.store.inject_auto_events(date);
        }
    }

    pub fn month_meta(&self) -> Option<&MonthMeta> {
        self.month_meta
            .get(&(self.selected_date.year(), self.selected_date.month()))
    }

    /// Fetch Hebrew dates and Shabbat/holiday times for the shown month once.
    pub async fn ensure_month_meta(&mut self) {
        let key = (self.selected_date.year(), self.selected_date.month());
        if self.month_meta.contains_key(&key) {
            return;
        }
        match self.hebcal.month(key.0, key.1, &self.settings.city).await {
            Ok(meta) => {
                self.month_meta.insert(key, meta);
            }
            Err(e) => {
                // cached empty so the grid still renders; retried on the next visit
                error!("hebcal: {}-{:02}: {e}", key.0, key.1);
                self.month_meta.insert(key, MonthMeta::default());
                self.status_message = Some("Hebrew calendar unavailable".to_string());
            }
        }
    }

    fn forget_failed_months(&mut self) {
        self.month_meta.retain(|_, meta| *meta != MonthMeta::default());
    }

    // ── Day data ──

    /// Records of the selected day ordered by start; untimed ones first.
    pub fn day_events(&self) -> Vec<&Event> {
        let mut events = self.store.events_for_date(self.selected_date, true);
        events.sort_by_key(|e| e.start);
        events
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.day_events().get(self.day_cursor).copied()
    }

    pub fn free_time(&self, date: NaiveDate) -> Vec<FreeInterval> {
        free_time(self.store.events_for_date(date, true))
    }

    /// User tasks from today through one month ahead.
    pub fn upcoming_tasks(&self) -> Vec<&Event> {
        let until = self
            .today
            .checked_add_months(Months::new(1))
            .unwrap_or(self.today);
        self.store.tasks_between(self.today, until)
    }

    pub fn cursor_down(&mut self) {
        let len = self.day_events().len();
        if self.day_cursor + 1 < len {
            self.day_cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.day_cursor = self.day_cursor.saturating_sub(1);
    }

    // ── Navigation ──

    pub fn next_day(&mut self) {
        self.selected_date = self
            .selected_date
            .succ_opt()
            .unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn prev_day(&mut self) {
        self.selected_date = self
            .selected_date
            .pred_opt()
            .unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn next_week(&mut self) {
        self.selected_date += chrono::Duration::weeks(1);
        self.on_date_changed();
    }

    pub fn prev_week(&mut self) {
        self.selected_date -= chrono::Duration::weeks(1);
        self.on_date_changed();
    }

    pub fn next_month(&mut self) {
        self.selected_date = self
            .selected_date
            .checked_add_months(Months::new(1))
            .unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn prev_month(&mut self) {
        self.selected_date = self
            .selected_date
            .checked_sub_months(Months::new(1))
            .unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.selected_date = self.today;
        self.on_date_changed();
    }

    fn on_date_changed(&mut self) {
        self.day_cursor = 0;
        let month = (self.selected_date.year(), self.selected_date.month());
        if month != self.shown_month {
            self.shown_month = month;
            self.forget_failed_months();
            self.prepare_month();
        }
        self.store.inject_auto_events(self.selected_date);
    }

    // ── Editing ──

    pub fn open_event_form(&mut self) {
        self.form_state = Some(EventFormState::new(self.selected_date));
        self.input_mode = InputMode::Form;
    }

    pub fn open_edit_form(&mut self) {
        let Some(event) = self.selected_event() else {
            self.status_message = Some("Nothing selected".to_string());
            return;
        };
        if event.auto {
            self.status_message = Some("Fixed events cannot be edited".to_string());
            return;
        }
        self.form_state = Some(EventFormState::from_event(event));
        self.input_mode = InputMode::Form;
    }

    pub fn close_event_form(&mut self) {
        self.form_state = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_event_form(&mut self) {
        let Some(form) = self.form_state.as_ref() else {
            return;
        };
        let event = match form.to_event() {
            Ok(event) => event,
            Err(msg) => {
                self.status_message = Some(msg.to_string());
                return;
            }
        };
        let verb = if form.is_edit() { "Updated" } else { "Added" };
        self.status_message = Some(format!("{verb} \"{}\"", event.title));
        let date = event.date;
        self.store.add_or_update(event);
        self.close_event_form();
        self.reschedule_reminders(Local::now().naive_local());
        self.selected_date = date;
        self.on_date_changed();
    }

    pub fn delete_selected_event(&mut self) {
        let Some(event) = self.selected_event() else {
            return;
        };
        if event.auto {
            self.status_message = Some("Fixed events cannot be deleted".to_string());
            return;
        }
        let (id, title) = (event.id.clone(), event.title.clone());
        if self.store.delete(&id, self.selected_date) {
            self.status_message = Some(format!("Deleted \"{title}\""));
            self.pending_reminders.retain(|r| r.event_id != id);
            self.cursor_up();
        }
    }

    // ── Popups ──

    pub fn show_detail(&mut self) {
        if let Some(event) = self.selected_event() {
            self.popup = Some(Popup::Detail(event.id.clone()));
        }
    }

    pub fn show_free_time(&mut self) {
        self.popup = Some(Popup::FreeTime(self.selected_date));
    }

    pub fn show_tasks(&mut self) {
        self.popup = Some(Popup::Tasks);
    }

    pub fn show_reminders(&mut self) {
        self.popup = Some(Popup::Reminders);
    }

    pub fn show_help(&mut self) {
        self.popup = Some(Popup::Help);
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub async fn show_weather(&mut self, date: NaiveDate) {
        let city = &self.settings.city;
        let report = self.weather.current(city.lat, city.lon).await;
        self.popup = Some(Popup::Weather { date, report });
    }

    /// The record behind the detail popup, user or auto.
    pub fn event_by_id(&self, id: &str) -> Option<&Event> {
        self.store
            .find(id)
            .or_else(|| self.day_events().into_iter().find(|e| e.id == id))
    }

    // ── Settings & reminders ──

    pub fn toggle_theme(&mut self) {
        self.settings.theme = self.settings.theme.toggle();
        self.theme = Theme::load(self.settings.theme);
        self.status_message = Some(format!("{:?} theme", self.theme.mode));
        if let Err(e) = self.settings.save() {
            warn!("settings: could not save theme: {e}");
        }
    }

    pub fn open_city_prompt(&mut self) {
        self.city_input = self.settings.city.name.clone();
        self.input_mode = InputMode::City;
    }

    pub fn close_city_prompt(&mut self) {
        self.city_input.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_city_prompt(&mut self) {
        let name = std::mem::take(&mut self.city_input);
        self.close_city_prompt();
        self.save_city_name(&name);
    }

    /// Rename the configured city. Coordinates stay as configured.
    pub fn save_city_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.status_message = Some("City name is empty".to_string());
            return;
        }
        self.settings.city.name = name.to_string();
        match self.settings.save() {
            Ok(()) => {
                info!("settings: city renamed to {name}");
                self.status_message = Some(format!("City saved: {name}"));
            }
            Err(e) => {
                warn!("settings: could not save city: {e}");
                self.status_message = Some(format!("City set to {name} (not saved)"));
            }
        }
    }

    pub fn reschedule_reminders(&mut self, now: NaiveDateTime) {
        self.pending_reminders = reminder::upcoming(&self.store, now);
    }

    /// Advance the clock: roll `today` over and surface due reminders.
    pub fn tick(&mut self, now: NaiveDateTime) {
        self.today = now.date();
        let due = reminder::take_due(&mut self.pending_reminders, now);
        if let Some(last) = due.last() {
            self.status_message = Some(format!("⏰ {}: {}", last.title, last.body()));
        }
        for r in &due {
            info!("reminder fired: {} ({})", r.title, r.body());
        }
    }
}
