use ratatui::style::Color;

use crate::model::UiConfig;

/// Parsed color theme for the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub accent: Color,
    pub warm: Color,
    pub cool: Color,
    pub alert: Color,
    pub selection_bg: Color,
    pub selection_border: Color,
    pub drag_ghost: Color,
    pub zone_armed: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x10, 0x0E, 0x17),
            text: Color::Rgb(0xC8, 0xC2, 0xDC),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFF, 0xA6, 0x3F),
            dim: Color::Rgb(0x6E, 0x68, 0x85),
            accent: Color::Rgb(0x5F, 0xB0, 0xFF),
            warm: Color::Rgb(0xFF, 0xD7, 0x00),
            cool: Color::Rgb(0x44, 0xDD, 0xFF),
            alert: Color::Rgb(0xFF, 0x44, 0x44),
            selection_bg: Color::Rgb(0x33, 0x29, 0x14),
            selection_border: Color::Rgb(0xFF, 0xA6, 0x3F),
            drag_ghost: Color::Rgb(0x3A, 0x34, 0x4E),
            zone_armed: Color::Rgb(0x2A, 0x45, 0x2A),
        }
    }
}

impl Theme {
    pub fn from_config(config: &UiConfig) -> Self {
        let mut theme = Theme::default();
        if let Some(color) = config.background.as_deref().and_then(parse_hex) {
            theme.background = color;
        }
        if let Some(color) = config.text.as_deref().and_then(parse_hex) {
            theme.text = color;
        }
        if let Some(color) = config.highlight.as_deref().and_then(parse_hex) {
            theme.highlight = color;
            theme.selection_border = color;
        }
        if let Some(color) = config.dim.as_deref().and_then(parse_hex) {
            theme.dim = color;
        }
        if let Some(color) = config.accent.as_deref().and_then(parse_hex) {
            theme.accent = color;
        }
        theme
    }
}

/// Parse "#RRGGBB" into a Color. Invalid strings fall back to None.
fn parse_hex(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
