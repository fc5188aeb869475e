//! User prompt seam.
//!
//! The recorder only ever needs two interactions outside the recording
//! screen: a yes/no confirmation (save or discard a cancelled clip) and a
//! blocking alert (fatal capture failure). Keeping them behind a trait lets
//! the state machine run under test without a terminal.

use anyhow::Result;

use crate::ui::AlertScreen;

/// Yes/no question and blocking notification capability.
pub trait UserPrompt {
    /// Asks a yes/no question and blocks until answered.
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Shows a blocking notification, dismissed by the user.
    fn alert(&mut self, message: &str) -> Result<()>;
}

/// Terminal implementation: cliclack confirm for questions, full-screen
/// alert for notifications. The caller must have left the recording TUI
/// (raw mode/alternate screen) before asking a question.
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPrompt for TerminalPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let keep = cliclack::confirm(question).initial_value(true).interact()?;
        tracing::debug!("Confirm '{}': {}", question, keep);
        Ok(keep)
    }

    fn alert(&mut self, message: &str) -> Result<()> {
        let mut screen = AlertScreen::new()?;
        screen.show(message)?;
        screen.cleanup()
    }
}
