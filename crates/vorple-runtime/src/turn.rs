#![forbid(unsafe_code)]

//! The turn model.
//!
//! A turn is one engine response cycle: the command the player typed, the
//! story's answer, and the prompt for the next command. The web layer
//! extracts a [`TurnStructure`] from the engine's output, the session wraps
//! it into [`TurnContent`] for the output filters, and the built-in meta
//! stage decides whether the result is rendered, shown as a notification, or
//! dropped.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vorple_core::VorpleError;
use vorple_style::ClassList;

/// What kind of turn the story says this is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnType {
    #[default]
    Normal,
    /// A parser error; shown, then faded out by the next input.
    Error,
    Undo,
    /// Out-of-world output, shown as a notification.
    Meta,
    /// Like meta, but modal.
    Dialog,
}

impl TurnType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Error => "error",
            Self::Undo => "undo",
            Self::Meta => "meta",
            Self::Dialog => "dialog",
        }
    }
}

impl FromStr for TurnType {
    type Err = VorpleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "error" => Ok(Self::Error),
            "undo" => Ok(Self::Undo),
            "meta" => Ok(Self::Meta),
            "dialog" => Ok(Self::Dialog),
            other => Err(VorpleError::UnknownTurnType {
                name: other.to_owned(),
            }),
        }
    }
}

/// Whether the engine finished the turn waiting for a line or a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMode {
    #[default]
    Line,
    Char,
}

/// Flags describing the turn currently in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    pub command_visible: bool,
    pub output_visible: bool,
    pub turn_type: TurnType,
    /// Mode of the most recently completed turn.
    pub mode: TurnMode,
    /// The dispatched command bypasses user filters.
    pub skip_filters: bool,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            command_visible: true,
            output_visible: true,
            turn_type: TurnType::Normal,
            mode: TurnMode::Line,
            skip_filters: false,
        }
    }
}

impl TurnState {
    /// Clear the per-command flags after a turn completes.
    pub fn reset_visibility(&mut self) {
        self.command_visible = true;
        self.output_visible = true;
        self.skip_filters = false;
    }

    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        !self.command_visible && !self.output_visible
    }
}

/// The three parts of a finished engine turn, as extracted from its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnStructure {
    /// The echoed command, HTML-escaped.
    pub previous_command: String,
    /// Everything between the command and the prompt, as HTML.
    pub content: String,
    /// The new prompt text. Always empty for char turns.
    pub prompt: String,
}

/// A piece of text with classes for its wrapper element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPart {
    pub text: String,
    pub classes: ClassList,
}

impl TextPart {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            classes: ClassList::new(),
        }
    }
}

/// The prompt shown after the turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptPart {
    pub text: String,
    /// Initial value of the input field.
    pub value: String,
    pub classes: ClassList,
}

/// What flows through the output filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnContent {
    pub previous_command: TextPart,
    pub content: TextPart,
    pub prompt: PromptPart,
    /// Out-of-flow turn: doesn't become the "previous turn".
    pub meta: bool,
    /// Classes for the turn container.
    pub classes: ClassList,
    /// Classes for the content wrapper.
    pub turn_classes: ClassList,
    pub mode: TurnMode,
}

impl TurnContent {
    #[must_use]
    pub fn from_structure(structure: TurnStructure, mode: TurnMode) -> Self {
        Self {
            previous_command: TextPart::new(structure.previous_command),
            content: TextPart::new(structure.content),
            prompt: PromptPart {
                text: structure.prompt,
                ..PromptPart::default()
            },
            mode,
            ..Self::default()
        }
    }
}

/// A message for the host to show outside the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub html: String,
    pub modal: bool,
    /// Button labels; each closes the notification.
    pub buttons: Vec<String>,
    pub close_button: bool,
}

impl Notification {
    #[must_use]
    pub fn toast(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            modal: false,
            buttons: Vec::new(),
            close_button: false,
        }
    }

    #[must_use]
    pub fn dialog(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            modal: true,
            buttons: vec!["ok".to_owned()],
            close_button: true,
        }
    }
}

/// Result of the built-in meta stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaDecision {
    Render(TurnContent),
    Notify(Notification),
    Discard,
}

/// Route a turn by its type.
///
/// Runs after user filters, whether or not they were skipped.
#[must_use]
pub fn meta_stage(mut content: TurnContent, turn: &TurnState) -> MetaDecision {
    match turn.turn_type {
        TurnType::Error => {
            content.classes.add("parserError");
            content.previous_command.classes.add("parserError");
            content.content.classes.add("transient");
            content.meta = true;
            MetaDecision::Render(content)
        }
        TurnType::Meta | TurnType::Dialog => {
            if visible_text(&content.content.text).trim().is_empty() {
                return MetaDecision::Discard;
            }
            let html = content.content.text;
            if turn.turn_type == TurnType::Dialog {
                MetaDecision::Notify(Notification::dialog(html))
            } else {
                MetaDecision::Notify(Notification::toast(html))
            }
        }
        TurnType::Normal | TurnType::Undo => MetaDecision::Render(content),
    }
}

/// The text of an HTML fragment with tags removed.
#[must_use]
pub fn visible_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text
}

/// What the host should do with a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Render into the transcript.
    Rendered(RenderedTurn),
    /// Show as a notification instead of rendering.
    Notified(Notification),
    /// Nothing to show.
    Suppressed,
}

/// A turn ready for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTurn {
    pub content: TurnContent,
    pub command_visible: bool,
    pub output_visible: bool,
    /// Value to put into the new prompt's input.
    pub prompt_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(turn_type: TurnType) -> TurnState {
        TurnState {
            turn_type,
            ..TurnState::default()
        }
    }

    fn content(html: &str) -> TurnContent {
        TurnContent::from_structure(
            TurnStructure {
                previous_command: "look".into(),
                content: html.into(),
                prompt: ">".into(),
            },
            TurnMode::Line,
        )
    }

    #[test]
    fn turn_type_names() {
        assert_eq!("dialog".parse::<TurnType>(), Ok(TurnType::Dialog));
        assert_eq!(
            "fancy".parse::<TurnType>(),
            Err(VorpleError::UnknownTurnType {
                name: "fancy".into()
            })
        );
        assert_eq!(TurnType::Meta.name(), "meta");
    }

    #[test]
    fn error_turns_are_marked() {
        let MetaDecision::Render(out) = meta_stage(content("That's not a verb."), &state(TurnType::Error))
        else {
            panic!("error turns render");
        };
        assert!(out.meta);
        assert!(out.classes.contains("parserError"));
        assert!(out.previous_command.classes.contains("parserError"));
        assert!(out.content.classes.contains("transient"));
    }

    #[test]
    fn meta_turns_become_notifications() {
        assert_eq!(
            meta_stage(content("<p>Score: 5</p>"), &state(TurnType::Meta)),
            MetaDecision::Notify(Notification::toast("<p>Score: 5</p>"))
        );
        let MetaDecision::Notify(note) = meta_stage(content("Sure?"), &state(TurnType::Dialog)) else {
            panic!("dialog turns notify");
        };
        assert!(note.modal);
        assert_eq!(note.buttons, vec!["ok".to_owned()]);
    }

    #[test]
    fn blank_meta_turns_are_discarded() {
        assert_eq!(
            meta_stage(content("<span> </span><br>"), &state(TurnType::Meta)),
            MetaDecision::Discard
        );
    }

    #[test]
    fn normal_turns_pass_through() {
        let input = content("West of House");
        assert_eq!(
            meta_stage(input.clone(), &state(TurnType::Normal)),
            MetaDecision::Render(input)
        );
    }

    #[test]
    fn visibility_reset() {
        let mut turn = TurnState {
            command_visible: false,
            output_visible: false,
            skip_filters: true,
            ..TurnState::default()
        };
        assert!(turn.is_hidden());
        turn.reset_visibility();
        assert_eq!(turn, TurnState::default());
    }

    #[test]
    fn tags_are_not_visible_text() {
        assert_eq!(visible_text("<b>bold</b> move"), "bold move");
    }
}
