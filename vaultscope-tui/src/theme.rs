//! Color theme for the TUI.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub text: Color,
    pub text_dim: Color,
    pub info: Color,
    pub warning: Color,
    pub error: Color,
    pub success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Magenta,
            text: Color::White,
            text_dim: Color::DarkGray,
            info: Color::Blue,
            warning: Color::Yellow,
            error: Color::Red,
            success: Color::Green,
        }
    }
}
