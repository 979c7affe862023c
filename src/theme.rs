use std::path::PathBuf;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::calendar::Owner;
use crate::config::ThemeMode;

#[derive(Debug, Clone)]
pub struct Theme {
    pub mode: ThemeMode,
    pub today: Style,
    pub selected: Style,
    pub header: Style,
    pub text: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub highlight: Style,
    pub hebrew: Style,
    pub shabbat: Style,
    pub holiday: Style,
    pub busy: Style,
    pub benjamin: Color,
    pub nana: Color,
    pub both: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Preset for `mode` with any `theme.toml` overrides applied.
    pub fn load(mode: ThemeMode) -> Self {
        let preset = Self::preset(mode);
        match read_overrides() {
            Some(config) => config.apply(preset),
            None => preset,
        }
    }

    pub fn preset(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    pub fn owner_color(&self, owner: Owner) -> Color {
        match owner {
            Owner::Benjamin => self.benjamin,
            Owner::Nana => self.nana,
            Owner::Both => self.both,
        }
    }

    fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            today: Style::default().fg(Color::Black).bg(Color::Yellow),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            highlight: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            hebrew: Style::default().fg(Color::LightBlue),
            shabbat: Style::default().fg(Color::Rgb(250, 189, 47)),
            holiday: Style::default().fg(Color::LightMagenta),
            busy: Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
            benjamin: Color::Rgb(96, 165, 250),
            nana: Color::Rgb(244, 114, 182),
            both: Color::Rgb(52, 211, 153),
        }
    }

    fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            today: Style::default().fg(Color::Black).bg(Color::Rgb(250, 204, 21)),
            selected: Style::default().fg(Color::White).bg(Color::Rgb(37, 99, 235)),
            header: Style::default().fg(Color::Black).add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Rgb(120, 120, 120)),
            border: Style::default().fg(Color::Rgb(160, 160, 160)),
            status: Style::default()
                .fg(Color::Black)
                .bg(Color::Rgb(220, 220, 220)),
            highlight: Style::default()
                .bg(Color::Rgb(220, 220, 220))
                .add_modifier(Modifier::BOLD),
            hebrew: Style::default().fg(Color::Blue),
            shabbat: Style::default().fg(Color::Rgb(180, 83, 9)),
            holiday: Style::default().fg(Color::Magenta),
            busy: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            benjamin: Color::Rgb(37, 99, 235),
            nana: Color::Rgb(219, 39, 119),
            both: Color::Rgb(5, 150, 105),
        }
    }
}

fn overrides_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("duo-calendar").join("theme.toml"))
}

fn read_overrides() -> Option<ThemeConfig> {
    let path = overrides_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("theme: ignoring {}: {e}", path.display());
            None
        }
    }
}

// ── TOML override types ──

#[derive(Debug, Deserialize, Default)]
struct ThemeConfig {
    today_fg: Option<String>,
    today_bg: Option<String>,
    selected_fg: Option<String>,
    selected_bg: Option<String>,
    dim_fg: Option<String>,
    border_fg: Option<String>,
    status_fg: Option<String>,
    status_bg: Option<String>,
    benjamin: Option<String>,
    nana: Option<String>,
    both: Option<String>,
}

impl ThemeConfig {
    fn apply(self, mut theme: Theme) -> Theme {
        if let Some(c) = self.today_fg.as_deref().and_then(parse_color) {
            theme.today = theme.today.fg(c);
        }
        if let Some(c) = self.today_bg.as_deref().and_then(parse_color) {
            theme.today = theme.today.bg(c);
        }
        if let Some(c) = self.selected_fg.as_deref().and_then(parse_color) {
            theme.selected = theme.selected.fg(c);
        }
        if let Some(c) = self.selected_bg.as_deref().and_then(parse_color) {
            theme.selected = theme.selected.bg(c);
        }
        if let Some(c) = self.dim_fg.as_deref().and_then(parse_color) {
            theme.dim = theme.dim.fg(c);
        }
        if let Some(c) = self.border_fg.as_deref().and_then(parse_color) {
            theme.border = theme.border.fg(c);
        }
        if let Some(c) = self.status_fg.as_deref().and_then(parse_color) {
            theme.status = theme.status.fg(c);
        }
        if let Some(c) = self.status_bg.as_deref().and_then(parse_color) {
            theme.status = theme.status.bg(c);
        }
        if let Some(c) = self.benjamin.as_deref().and_then(parse_color) {
            theme.benjamin = c;
        }
        if let Some(c) = self.nana.as_deref().and_then(parse_color) {
            theme.nana = c;
        }
        if let Some(c) = self.both.as_deref().and_then(parse_color) {
            theme.both = c;
        }
        theme
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        "lightmagenta" => Some(Color::LightMagenta),
        "lightcyan" => Some(Color::LightCyan),
        _ => None,
    }
}
