#![forbid(unsafe_code)]

//! The non-fatal error reporter and the story's debug switch.
//!
//! Errors are logged through `tracing` and kept for the host to show in the
//! page. Nothing here panics or stops the session.

use vorple_core::VorpleError;

#[derive(Debug, Default)]
pub struct Reporter {
    debugging: bool,
    errors: Vec<String>,
}

impl Reporter {
    #[must_use]
    pub fn new(debugging: bool) -> Self {
        Self {
            debugging,
            errors: Vec::new(),
        }
    }

    /// Log an error and keep its message for display.
    pub fn error(&mut self, error: &VorpleError) {
        tracing::error!(target: "vorple.session", %error, "reported");
        self.errors.push(error.to_string());
    }

    /// Messages reported since the last call.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// A debug line for the main window, when debugging is on.
    pub fn log(&self, text: &str) -> Option<String> {
        if !self.debugging {
            return None;
        }
        tracing::debug!(target: "vorple.session", text, "story debug");
        Some(format!("[{text}]\n"))
    }

    pub fn on(&mut self) -> bool {
        self.debugging = true;
        true
    }

    pub fn off(&mut self) -> bool {
        self.debugging = false;
        true
    }

    /// Flip the switch, or set it when `to` is given. Returns the new state.
    pub fn toggle(&mut self, to: Option<bool>) -> bool {
        self.debugging = to.unwrap_or(!self.debugging);
        self.debugging
    }

    #[must_use]
    pub const fn status(&self) -> bool {
        self.debugging
    }
}
