pub mod day_view;
pub mod event_form;
pub mod month_view;
pub mod popups;
pub mod reminder_list;
pub mod status_bar;

use ratatui::layout::Rect;

pub use day_view::DayView;
pub use event_form::EventForm;
pub use month_view::MonthView;
pub use reminder_list::ReminderList;
pub use status_bar::StatusBar;

/// A `w` x `h` rectangle centered in `area`, clamped to its size.
pub fn centered(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}
