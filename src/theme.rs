use std::path::PathBuf;
use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use tracing::warn;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Get the active theme (loaded once on first call).
pub fn current() -> &'static Theme {
    THEME.get_or_init(|| Theme::load().unwrap_or_default())
}

/// Segment colors handed out to feeds without a configured color.
const FEED_PALETTE: [Color; 6] = [
    Color::Rgb(102, 140, 217),
    Color::Rgb(82, 183, 136),
    Color::Rgb(232, 163, 61),
    Color::Rgb(200, 104, 178),
    Color::Rgb(217, 96, 96),
    Color::Rgb(140, 140, 140),
];

pub fn feed_color(label: usize) -> Color {
    FEED_PALETTE[label % FEED_PALETTE.len()]
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub today: Style,
    pub selected: Style,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    /// The "more" overflow marker.
    pub more: Style,
    /// Text drawn on top of a feed-colored segment.
    pub segment_fg: Color,
}

/// The handful of colors a preset is built from.
struct Palette {
    name: &'static str,
    today: Color,
    accent: Color,
    text: Color,
    muted: Color,
    surface: Color,
}

impl Palette {
    fn theme(&self) -> Theme {
        Theme {
            name: self.name.to_string(),
            today: Style::default().fg(Color::Black).bg(self.today),
            selected: Style::default().fg(Color::Black).bg(self.accent),
            header: Style::default().fg(self.text).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(self.muted),
            border: Style::default().fg(self.surface),
            status: Style::default().fg(self.text).bg(self.surface),
            more: Style::default().fg(self.accent).add_modifier(Modifier::UNDERLINED),
            segment_fg: Color::Black,
        }
    }
}

const DRACULA: Palette = Palette {
    name: "dracula",
    today: Color::Rgb(189, 147, 249),
    accent: Color::Rgb(139, 233, 253),
    text: Color::Rgb(248, 248, 242),
    muted: Color::Rgb(98, 114, 164),
    surface: Color::Rgb(68, 71, 90),
};

const GRUVBOX: Palette = Palette {
    name: "gruvbox",
    today: Color::Rgb(250, 189, 47),
    accent: Color::Rgb(131, 165, 152),
    text: Color::Rgb(235, 219, 178),
    muted: Color::Rgb(146, 131, 116),
    surface: Color::Rgb(80, 73, 69),
};

const NORD: Palette = Palette {
    name: "nord",
    today: Color::Rgb(235, 203, 139),
    accent: Color::Rgb(136, 192, 208),
    text: Color::Rgb(229, 233, 240),
    muted: Color::Rgb(76, 86, 106),
    surface: Color::Rgb(67, 76, 94),
};

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            today: Style::default().fg(Color::Black).bg(Color::Yellow),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            more: Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
            segment_fg: Color::Black,
        }
    }
}

impl Theme {
    /// `<config_dir>/calgrid/theme.toml`, if present and valid.
    pub fn load() -> Option<Self> {
        let path = config_path()?;
        if !path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(&path).ok()?;
        match Self::from_toml(&content) {
            Ok(theme) => Some(theme),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid theme");
                None
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let config: ThemeConfig = toml::from_str(content)?;
        Ok(config.into_theme())
    }

    /// Get a built-in preset by name.
    pub fn preset(name: &str) -> Self {
        match name {
            "dracula" => DRACULA.theme(),
            "gruvbox" => GRUVBOX.theme(),
            "nord" => NORD.theme(),
            _ => Self::default(),
        }
    }

    /// Style of a segment from the feed with the given color.
    pub fn segment(&self, color: Color) -> Style {
        Style::default().fg(self.segment_fg).bg(color)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("calgrid").join("theme.toml"))
}

// ── TOML config types ──

#[derive(Debug, Deserialize, Default)]
struct ThemeConfig {
    preset: Option<String>,
    today_bg: Option<String>,
    selected_bg: Option<String>,
    header_fg: Option<String>,
    dim_fg: Option<String>,
    border_fg: Option<String>,
    status_fg: Option<String>,
    status_bg: Option<String>,
    more_fg: Option<String>,
    segment_fg: Option<String>,
}

impl ThemeConfig {
    fn into_theme(self) -> Theme {
        let mut theme = self
            .preset
            .as_deref()
            .map(Theme::preset)
            .unwrap_or_default();

        let color = |s: &Option<String>| s.as_deref().and_then(parse_color);
        if let Some(c) = color(&self.today_bg) {
            theme.today = theme.today.bg(c);
        }
        if let Some(c) = color(&self.selected_bg) {
            theme.selected = theme.selected.bg(c);
        }
        if let Some(c) = color(&self.header_fg) {
            theme.header = theme.header.fg(c);
        }
        if let Some(c) = color(&self.dim_fg) {
            theme.dim = theme.dim.fg(c);
        }
        if let Some(c) = color(&self.border_fg) {
            theme.border = theme.border.fg(c);
        }
        if let Some(c) = color(&self.status_fg) {
            theme.status = theme.status.fg(c);
        }
        if let Some(c) = color(&self.status_bg) {
            theme.status = theme.status.bg(c);
        }
        if let Some(c) = color(&self.more_fg) {
            theme.more = theme.more.fg(c);
        }
        if let Some(c) = color(&self.segment_fg) {
            theme.segment_fg = c;
        }

        theme
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#').filter(|h| h.len() == 6) {
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    let color = match s.to_lowercase().replace(['_', '-'], "").as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        _ => return None,
    };
    Some(color)
}
