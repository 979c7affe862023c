use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::calendar::Owner;
use crate::theme::Theme;

pub struct StatusBar;

impl StatusBar {
    /// Owner legend on the left; the last status message or key hints on the right.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        message: Option<&str>,
        edit_hints: Option<&str>,
        theme: &Theme,
    ) {
        let w = area.width as usize;

        let mut spans = vec![Span::styled(" ", theme.status)];
        let mut used = 1;
        if w >= 50 {
            for owner in Owner::ALL {
                let label = format!("● {} ", owner.label());
                used += label.chars().count();
                spans.push(Span::styled(
                    label,
                    theme.status.patch(Style::default().fg(theme.owner_color(owner))),
                ));
            }
        }

        let right = match message {
            Some(msg) => format!(" {msg} "),
            None => match edit_hints {
                Some(edit) => format!(" {edit} "),
                None => hints(w).to_string(),
            },
        };

        let padding = w.saturating_sub(used + right.chars().count());
        spans.push(Span::styled(" ".repeat(padding), theme.status));
        spans.push(Span::styled(right, theme.status));

        frame.render_widget(Paragraph::new(Line::from(spans)).style(theme.status), area);
    }
}

fn hints(width: usize) -> &'static str {
    if width >= 110 {
        " hl:Day [/]:Month t:Today n:New e:Edit d:Del f:Free T:Tasks w:Weather c:City ?:Help q:Quit "
    } else if width >= 70 {
        " n:New e:Edit d:Del f:Free T:Tasks ?:Help q:Quit "
    } else {
        " ?:Help q:Quit "
    }
}
