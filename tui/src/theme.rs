//! Color themes and glyphs for the Orion TUI.
//!
//! Dark uses a slate palette; light inverts the backgrounds and keeps the
//! persona accents readable on white.

use ratatui::style::{Color, Modifier, Style};

use orion_types::Accent;
use orion_types::ui::Theme;

mod colors {
    use super::Color;

    // === Dark (slate) ===
    pub const DARK_BG: Color = Color::Rgb(15, 23, 42); // slate-900
    pub const DARK_PANEL: Color = Color::Rgb(30, 41, 59); // slate-800
    pub const DARK_BORDER: Color = Color::Rgb(71, 85, 105); // slate-600
    pub const DARK_TEXT: Color = Color::Rgb(226, 232, 240); // slate-200
    pub const DARK_MUTED: Color = Color::Rgb(148, 163, 184); // slate-400

    // === Light ===
    pub const LIGHT_BG: Color = Color::Rgb(248, 250, 252); // slate-50
    pub const LIGHT_PANEL: Color = Color::Rgb(226, 232, 240); // slate-200
    pub const LIGHT_BORDER: Color = Color::Rgb(148, 163, 184); // slate-400
    pub const LIGHT_TEXT: Color = Color::Rgb(15, 23, 42); // slate-900
    pub const LIGHT_MUTED: Color = Color::Rgb(100, 116, 139); // slate-500

    // === Persona accents ===
    pub const BLUE: Color = Color::Rgb(59, 130, 246);
    pub const PURPLE: Color = Color::Rgb(168, 85, 247);
    pub const ORANGE: Color = Color::Rgb(249, 115, 22);
    pub const EMERALD: Color = Color::Rgb(16, 185, 129);

    pub const RED: Color = Color::Rgb(239, 68, 68);
    pub const GREEN: Color = Color::Rgb(34, 197, 94);
}

/// Resolved palette for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub bg_panel: Color,
    pub border: Color,
    pub text: Color,
    pub text_muted: Color,
    pub primary: Color,
    pub success: Color,
    pub error: Color,
}

impl Palette {
    #[must_use]
    pub fn dark() -> Self {
        Self {
            bg: colors::DARK_BG,
            bg_panel: colors::DARK_PANEL,
            border: colors::DARK_BORDER,
            text: colors::DARK_TEXT,
            text_muted: colors::DARK_MUTED,
            primary: colors::BLUE,
            success: colors::GREEN,
            error: colors::RED,
        }
    }

    #[must_use]
    pub fn light() -> Self {
        Self {
            bg: colors::LIGHT_BG,
            bg_panel: colors::LIGHT_PANEL,
            border: colors::LIGHT_BORDER,
            text: colors::LIGHT_TEXT,
            text_muted: colors::LIGHT_MUTED,
            primary: colors::BLUE,
            success: colors::GREEN,
            error: colors::RED,
        }
    }

    #[must_use]
    pub fn accent(&self, accent: Accent) -> Color {
        match accent {
            Accent::Blue => colors::BLUE,
            Accent::Purple => colors::PURPLE,
            Accent::Orange => colors::ORANGE,
            Accent::Emerald => colors::EMERALD,
        }
    }
}

#[must_use]
pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette::dark(),
        Theme::Light => Palette::light(),
    }
}

pub mod glyphs {
    pub const USER: &str = "○";
    pub const ASSISTANT: &str = "◇";
    pub const SYSTEM: &str = "●";
    pub const SELECTED: &str = "▸";
    pub const VOICE_ON: &str = "♪";
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[must_use]
pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Pre-defined styles for common UI elements.
pub mod styles {
    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn base(palette: &Palette) -> Style {
        Style::default().fg(palette.text).bg(palette.bg)
    }

    #[must_use]
    pub fn user_name(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.success)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border(palette: &Palette) -> Style {
        Style::default().fg(palette.border)
    }

    #[must_use]
    pub fn tab_active(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.bg)
            .bg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }

    #[must_use]
    pub fn key_highlight(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }
}
