//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages and confirmation prompts (yellow)
    pub warning: Style,
    /// Error messages (red)
    pub error: Style,
    /// Progress steps (blue)
    pub info: Style,
    /// Dimmed/secondary text
    pub dim: Style,
    /// Bold white step text
    pub bold: Style,
    /// Headers/section titles
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().bold().yellow();
        self.error = Style::new().bold().red();
        self.info = Style::new().bold().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold().white();
        self.header = Style::new().bold().cyan();
    }
}
