//! Neon-on-charcoal palette and the styles built from it.

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);

/// Actual closes.
pub const ACTUAL_LINE: Color = ACCENT;
/// Forecast path, drawn apart from the actual line.
pub const FORECAST_LINE: Color = WARNING;

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Highlight for the focused form field.
pub fn focused() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Colour for a stationarity verdict.
pub fn verdict(is_stationary: bool) -> Style {
    if is_stationary {
        positive()
    } else {
        neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_and_actual_are_distinct() {
        assert_ne!(ACTUAL_LINE, FORECAST_LINE);
    }

    #[test]
    fn panel_styles_follow_focus() {
        assert_eq!(panel_border(true).fg, Some(ACCENT));
        assert_eq!(panel_border(false).fg, Some(MUTED));
        assert!(panel_title(true).add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn verdict_colors() {
        assert_eq!(verdict(true).fg, Some(POSITIVE));
        assert_eq!(verdict(false).fg, Some(NEUTRAL));
    }
}
