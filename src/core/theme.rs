//! # Themes
//!
//! The five built-in color schemes and the resolver that maps a theme
//! identifier (as stored in preferences) to one of them.
//!
//! ```text
//! "legacy"        → LEGACY
//! "light"         → LIGHT
//! "sepia"         → SEPIA
//! "solarizedDark" → SOLARIZED_DARK
//! "dark"          → DARK
//! anything else   → DARK
//! ```
//!
//! Themes are plain data. The TUI turns them into ratatui styles and the
//! markdown renderer picks `code_theme` out of them for fenced code blocks.

use ratatui::style::{Color, Modifier, Style};

/// A complete color scheme for the shell.
#[derive(Debug, PartialEq, Eq)]
pub struct Theme {
    /// Identifier as it appears in `general.theme`.
    pub id: &'static str,
    /// Human-readable label for the preferences panel.
    pub label: &'static str,
    pub background: Color,
    pub foreground: Color,
    /// Background of editor surfaces (the markdown preview pane).
    pub surface: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    /// Name of the syntect theme used for fenced code blocks.
    pub code_theme: &'static str,
}

impl Theme {
    /// Base style applied to every cell that nothing else styled.
    pub fn base_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn surface_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.surface)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.border)
        }
    }
}

pub static LEGACY: Theme = Theme {
    id: "legacy",
    label: "Legacy",
    background: Color::Rgb(0x2c, 0x2c, 0x2c),
    foreground: Color::Rgb(0xe0, 0xe0, 0xe0),
    surface: Color::Rgb(0x1e, 0x1e, 0x1e),
    muted: Color::Rgb(0x88, 0x88, 0x88),
    border: Color::Rgb(0x44, 0x44, 0x44),
    accent: Color::Rgb(0x5a, 0xb2, 0xff),
    selection_bg: Color::Rgb(0x26, 0x4f, 0x78),
    selection_fg: Color::White,
    code_theme: "base16-eighties.dark",
};

pub static LIGHT: Theme = Theme {
    id: "light",
    label: "Light",
    background: Color::Rgb(0xfa, 0xfa, 0xfa),
    foreground: Color::Rgb(0x21, 0x25, 0x29),
    surface: Color::White,
    muted: Color::Rgb(0x6c, 0x75, 0x7d),
    border: Color::Rgb(0xd0, 0xd4, 0xd9),
    accent: Color::Rgb(0x1e, 0x88, 0xe5),
    selection_bg: Color::Rgb(0xb3, 0xd7, 0xff),
    selection_fg: Color::Black,
    code_theme: "InspiredGitHub",
};

pub static SEPIA: Theme = Theme {
    id: "sepia",
    label: "Sepia",
    background: Color::Rgb(0xf4, 0xec, 0xd8),
    foreground: Color::Rgb(0x5b, 0x46, 0x36),
    surface: Color::Rgb(0xfb, 0xf5, 0xe6),
    muted: Color::Rgb(0x9c, 0x86, 0x6e),
    border: Color::Rgb(0xd9, 0xc9, 0xa8),
    accent: Color::Rgb(0xb5, 0x6a, 0x2c),
    selection_bg: Color::Rgb(0xe6, 0xcf, 0x9e),
    selection_fg: Color::Rgb(0x3b, 0x2a, 0x1c),
    code_theme: "Solarized (light)",
};

pub static SOLARIZED_DARK: Theme = Theme {
    id: "solarizedDark",
    label: "Solarized Dark",
    background: Color::Rgb(0x00, 0x2b, 0x36),
    foreground: Color::Rgb(0x83, 0x94, 0x96),
    surface: Color::Rgb(0x07, 0x36, 0x42),
    muted: Color::Rgb(0x58, 0x6e, 0x75),
    border: Color::Rgb(0x0d, 0x4a, 0x58),
    accent: Color::Rgb(0x26, 0x8b, 0xd2),
    selection_bg: Color::Rgb(0x07, 0x4e, 0x5e),
    selection_fg: Color::Rgb(0xee, 0xe8, 0xd5),
    code_theme: "Solarized (dark)",
};

pub static DARK: Theme = Theme {
    id: "dark",
    label: "Dark",
    background: Color::Rgb(0x1e, 0x20, 0x22),
    foreground: Color::Rgb(0xd4, 0xd4, 0xd4),
    surface: Color::Rgb(0x16, 0x18, 0x1a),
    muted: Color::Rgb(0x7a, 0x7f, 0x85),
    border: Color::Rgb(0x3a, 0x3d, 0x41),
    accent: Color::Rgb(0x4c, 0xb0, 0x9c),
    selection_bg: Color::Rgb(0x2f, 0x55, 0x6b),
    selection_fg: Color::White,
    code_theme: "base16-ocean.dark",
};

/// Theme identifiers in the order the preferences panel cycles through them.
pub const THEME_IDS: [&str; 5] = ["dark", "light", "sepia", "solarizedDark", "legacy"];

/// Resolve a theme identifier. Total: unknown identifiers get the dark theme.
pub fn resolve(id: &str) -> &'static Theme {
    match id {
        "legacy" => &LEGACY,
        "light" => &LIGHT,
        "sepia" => &SEPIA,
        "solarizedDark" => &SOLARIZED_DARK,
        "dark" => &DARK,
        _ => &DARK,
    }
}

/// The identifier that follows `id` in [`THEME_IDS`], wrapping around.
/// Unknown identifiers cycle as if they were `dark`.
pub fn next_id(id: &str) -> &'static str {
    let current = resolve(id).id;
    let pos = THEME_IDS.iter().position(|t| *t == current).unwrap_or(0);
    THEME_IDS[(pos + 1) % THEME_IDS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids_resolve_to_their_theme() {
        assert_eq!(resolve("legacy"), &LEGACY);
        assert_eq!(resolve("light"), &LIGHT);
        assert_eq!(resolve("sepia"), &SEPIA);
        assert_eq!(resolve("solarizedDark"), &SOLARIZED_DARK);
        assert_eq!(resolve("dark"), &DARK);
    }

    #[test]
    fn test_unknown_ids_fall_back_to_dark() {
        for id in ["", "Dark", "solarized", "solarized-dark", "midnight", " light"] {
            assert_eq!(resolve(id), &DARK, "{id:?} should fall back to dark");
        }
    }

    #[test]
    fn test_every_listed_id_round_trips() {
        for id in THEME_IDS {
            assert_eq!(resolve(id).id, id);
        }
    }

    #[test]
    fn test_next_id_cycles_and_wraps() {
        assert_eq!(next_id("dark"), "light");
        assert_eq!(next_id("legacy"), "dark");
        assert_eq!(next_id("unknown"), "light");
    }
}
