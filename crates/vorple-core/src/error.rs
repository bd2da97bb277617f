#![forbid(unsafe_code)]

//! Error taxonomy shared by every Vorple crate.
//!
//! None of these errors halt the session. The runtime's reporter logs them,
//! records them for in-page display, and keeps the current turn and queue
//! state for the next interaction. Only [`VorpleError::VersionMismatch`] is
//! ever handed back to a caller as a hard `Err`, and only when no callback
//! was supplied to the version check.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VorpleError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VorpleError {
    #[error("Event name missing when trying to {action} an event listener")]
    MissingEventName { action: &'static str },

    #[error("Tried to {action} a listener to an unknown event {name}")]
    UnknownEvent { action: &'static str, name: String },

    #[error("Interpreter error: unknown input mode {mode}")]
    UnknownInputMode { mode: String },

    #[error("unknown turn type: {name}")]
    UnknownTurnType { name: String },

    #[error("unknown option: {name}")]
    UnknownOption { name: String },

    #[error("invalid value for option {name}: expected {expected}")]
    InvalidOption { name: String, expected: &'static str },

    #[error("unexpected output from the engine: {output}")]
    EngineOutput { output: String },

    #[error("JavaScript code from story file threw an error: {message}\n\n{snippet}")]
    UserCode { snippet: String, message: String },

    #[error("Vorple version {required} was requested, but Vorple is at version {current}")]
    VersionMismatch { required: String, current: String },

    #[error("Version mismatch: release {required} required, currently running release {current}")]
    ReleaseMismatch { required: String, current: u32 },

    #[error("malformed version string: {version}")]
    InvalidVersion { version: String },
}

impl VorpleError {
    /// Whether this error belongs to the configuration class (bad names,
    /// unknown modes, bad option values) rather than engine or story output.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingEventName { .. }
                | Self::UnknownEvent { .. }
                | Self::UnknownInputMode { .. }
                | Self::UnknownTurnType { .. }
                | Self::UnknownOption { .. }
                | Self::InvalidOption { .. }
        )
    }

    #[must_use]
    pub fn user_code(snippet: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UserCode {
            snippet: snippet.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VorpleError;

    #[test]
    fn unknown_mode_message_names_the_mode() {
        let error = VorpleError::UnknownInputMode {
            mode: "sideways".into(),
        };
        assert_eq!(
            error.to_string(),
            "Interpreter error: unknown input mode sideways"
        );
        assert!(error.is_configuration());
    }

    #[test]
    fn user_code_error_carries_snippet() {
        let error = VorpleError::user_code("alert(", "unexpected end of input");
        let text = error.to_string();
        assert!(text.contains("unexpected end of input"));
        assert!(text.ends_with("alert("));
        assert!(!error.is_configuration());
    }

    #[test]
    fn version_mismatch_reads_like_a_sentence() {
        let error = VorpleError::VersionMismatch {
            required: "4".into(),
            current: "3.2.8".into(),
        };
        assert_eq!(
            error.to_string(),
            "Vorple version 4 was requested, but Vorple is at version 3.2.8"
        );
    }
}
