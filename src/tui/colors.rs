//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;

/// Used for Low priority and the progress gauge
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Used for Medium priority and the focused form field
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for High priority and the confirm dialog
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Header and status bar background
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

/// Foreground color for a priority cell.
pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => GOLD,
        Priority::High => Color::Red,
    }
}
