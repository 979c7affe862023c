mod app;
mod calendar;
mod components;
mod config;
mod event;
mod hebcal;
mod http;
mod logging;
mod theme;
mod tui;
mod weather;

use std::time::Duration;

use app::{App, InputMode, Popup};
use calendar::{JsonFile, Store};
use chrono::Local;
use color_eyre::Result;
use components::{popups, DayView, EventForm, MonthView, ReminderList, StatusBar};
use config::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{error, info, warn};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::Frame;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (settings, settings_err) = Settings::load_or_default();

    let data_dir = settings.data_dir();
    let log_dir = data_dir
        .as_ref()
        .map_or_else(|| std::env::temp_dir().join("duo-calendar"), |d| d.join("logs"));
    let _logger = match logging::init(&settings.log_level, &log_dir) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("logging disabled: {e}");
            None
        }
    };
    if let Some(e) = settings_err {
        warn!("settings: using defaults: {e}");
    }

    let store = match data_dir {
        Some(dir) => {
            let backend = JsonFile::in_dir(&dir);
            info!("store: {}", backend.path().display());
            Store::new(Box::new(backend))
        }
        None => {
            warn!("store: no data directory, changes will not be saved");
            Store::in_memory()
        }
    };
    let mut app = App::new(settings, store, http::client()?);

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!("panic: {}", logging::panic_summary(panic_info));
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;
    info!("app_exit ok={}", result.is_ok());
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.ensure_month_meta().await;
        app.tick(Local::now().naive_local());

        terminal.draw(|frame| draw(frame, app))?;

        if let Some(key) = event::next_key_event(Duration::from_millis(250))? {
            // Clear status message on any key
            app.status_message = None;

            if app.popup.is_some() {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
                    app.close_popup();
                }
                continue;
            }

            match app.input_mode {
                InputMode::Form => handle_form_input(app, key),
                InputMode::City => handle_city_input(app, key),
                InputMode::Normal => handle_normal_input(app, key).await,
            }
        }
    }

    Ok(())
}

async fn handle_normal_input(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.cursor_up(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.cursor_down(),
        (KeyCode::Char('K'), _) => app.prev_week(),
        (KeyCode::Char('J'), _) => app.next_week(),
        (KeyCode::Char('['), _) => app.prev_month(),
        (KeyCode::Char(']'), _) => app.next_month(),
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Char('n'), _) => app.open_event_form(),
        (KeyCode::Char('e'), _) => app.open_edit_form(),
        (KeyCode::Char('d'), _) => app.delete_selected_event(),
        (KeyCode::Enter, _) => app.show_detail(),
        (KeyCode::Char('f'), _) => app.show_free_time(),
        (KeyCode::Char('T'), _) => app.show_tasks(),
        (KeyCode::Char('r'), _) => app.show_reminders(),
        (KeyCode::Char('w'), _) => {
            let date = app.selected_date;
            app.show_weather(date).await;
        }
        (KeyCode::Char('L'), _) => app.toggle_theme(),
        (KeyCode::Char('c'), _) => app.open_city_prompt(),
        (KeyCode::Char('?'), _) => app.show_help(),
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.close_event_form();
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit_event_form();
        return;
    }
    let Some(form) = app.form_state.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Left | KeyCode::Right if form.active_field.is_choice() => form.cycle_choice(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
}

fn handle_city_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_city_prompt(),
        KeyCode::Enter => app.submit_city_prompt(),
        KeyCode::Backspace => {
            app.city_input.pop();
        }
        KeyCode::Char(c) => app.city_input.push(c),
        _ => {}
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

    render_calendar(frame, layout[0], app);

    if let Some(form) = &app.form_state {
        EventForm::render(frame, area, form, &app.theme);
    }
    if app.input_mode == InputMode::City {
        popups::render_city_prompt(frame, area, &app.city_input, &app.theme);
    }
    if let Some(popup) = &app.popup {
        render_popup(frame, area, app, popup);
    }

    StatusBar::render(
        frame,
        layout[1],
        app.status_message.as_deref(),
        match app.input_mode {
            InputMode::Normal => None,
            InputMode::Form => Some("Tab:Next Enter:Save Esc:Cancel"),
            InputMode::City => Some("Enter:Save Esc:Cancel"),
        },
        &app.theme,
    );
}

fn render_calendar(frame: &mut Frame, area: Rect, app: &App) {
    let meta = app.month_meta();
    let (month_area, day_area) = if area.width < 60 {
        (area, None)
    } else {
        let month_w = if area.width >= 100 { 50 } else { 36 };
        let content =
            Layout::horizontal([Constraint::Length(month_w), Constraint::Min(20)]).split(area);
        (content[0], Some(content[1]))
    };

    MonthView::render(
        frame,
        month_area,
        app.selected_date,
        app.today,
        &app.store,
        meta,
        &app.theme,
    );

    if let Some(day_area) = day_area {
        DayView::render(
            frame,
            day_area,
            app.selected_date,
            &app.day_events(),
            app.day_cursor,
            meta.and_then(|m| m.hebrew_day(app.selected_date)),
            meta.and_then(|m| m.day(app.selected_date)),
            &app.theme,
        );
    }
}

fn render_popup(frame: &mut Frame, area: Rect, app: &App, popup: &Popup) {
    let theme = &app.theme;
    match popup {
        Popup::Detail(id) => {
            if let Some(ev) = app.event_by_id(id) {
                components::day_view::render_detail_popup(frame, area, ev, theme);
            }
        }
        Popup::FreeTime(date) => {
            popups::render_free_time(frame, area, *date, &app.free_time(*date), theme);
        }
        Popup::Tasks => popups::render_tasks(frame, area, &app.upcoming_tasks(), theme),
        Popup::Reminders => ReminderList::render(
            frame,
            area,
            &app.pending_reminders,
            Local::now().naive_local(),
            theme,
        ),
        Popup::Weather { date, report } => popups::render_weather(
            frame,
            area,
            *date,
            &app.settings.city.name,
            report.as_ref(),
            theme,
        ),
        Popup::Help => popups::render_help(frame, area, theme),
    }
}
