#![forbid(unsafe_code)]

//! The visible story transcript.
//!
//! # Role in Vorple
//! Rendered turns are appended here as blocks: a `turn` wrapper holding the
//! turn's content and Vorple's own prompt. When the next turn renders, the
//! previous prompt's input is replaced by the command the player typed (or
//! the prompt is dropped if the command was hidden).
//!
//! # Markers
//! The newest normal line turn carries `previousTurn` and the one before it
//! `penultimateTurn`. Meta turns and char turns leave the markers alone.
//! Content marked `transient` (error responses) disappears on the next text
//! input.

use std::fmt::Write as _;

use vorple_runtime::{RenderedTurn, TurnMode};
use vorple_style::ClassList;

const PREVIOUS: &str = "previousTurn";
const PENULTIMATE: &str = "penultimateTurn";
const TRANSIENT: &str = "transient";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    /// Still waiting for input, with the text field's value.
    Field { value: String },
    /// Replaced by the command that was submitted.
    Command { html: String, classes: ClassList },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBlock {
    /// Prompt text, as HTML.
    pub html: String,
    pub classes: ClassList,
    pub input: PromptInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub html: String,
    /// Classes of the `turnContent` wrapper.
    pub classes: ClassList,
    /// Classes of the content itself.
    pub content_classes: ClassList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnBlock {
    pub classes: ClassList,
    pub content: Option<ContentBlock>,
    pub prompt: Option<PromptBlock>,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<TurnBlock>,
}

impl Transcript {
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    #[must_use]
    pub fn turns(&self) -> &[TurnBlock] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The prompt currently waiting for input, if any.
    #[must_use]
    pub fn current_prompt(&self) -> Option<&PromptBlock> {
        self.turns.last()?.prompt.as_ref()
    }

    pub fn render(&mut self, rendered: &RenderedTurn) {
        let turn = &rendered.content;
        let prompt = PromptBlock {
            html: turn.prompt.text.clone(),
            classes: with_class("vorplePrompt", &turn.prompt.classes),
            input: PromptInput::Field {
                value: rendered.prompt_value.clone(),
            },
        };

        // A char turn continues the turn block that is already on screen.
        if turn.mode == TurnMode::Char
            && let Some(last) = self.turns.last_mut()
        {
            let span = format!("<span>{}</span>", turn.content.text);
            match &mut last.content {
                Some(content) => content.html.push_str(&span),
                None => {
                    last.content = Some(ContentBlock {
                        html: span,
                        classes: ClassList::parse("turnContent"),
                        content_classes: ClassList::new(),
                    });
                }
            }
            last.prompt = Some(prompt);
            tracing::trace!(target: "vorple.web", turns = self.turns.len(), "char turn appended");
            return;
        }

        if let Some(last) = self.turns.last_mut() {
            if rendered.command_visible {
                if let Some(old) = last.prompt.as_mut() {
                    old.input = PromptInput::Command {
                        html: turn.previous_command.text.clone(),
                        classes: with_class("previousCommand", &turn.previous_command.classes),
                    };
                }
            } else {
                last.prompt = None;
            }
        }

        let content = rendered.output_visible.then(|| ContentBlock {
            html: turn.content.text.clone(),
            classes: with_class("turnContent", &turn.turn_classes),
            content_classes: turn.content.classes.clone(),
        });

        let mut classes = with_class("turn", &turn.classes);
        if !turn.meta && turn.mode == TurnMode::Line {
            for block in &mut self.turns {
                block.classes.remove(PENULTIMATE);
                if block.classes.remove(PREVIOUS) {
                    block.classes.add(PENULTIMATE);
                }
            }
            classes.add(PREVIOUS);
        }

        self.turns.push(TurnBlock {
            classes,
            content,
            prompt: Some(prompt),
        });
        tracing::trace!(target: "vorple.web", turns = self.turns.len(), "turn rendered");
    }

    /// Drop everything marked transient. Returns how many blocks went.
    pub fn clear_transient(&mut self) -> usize {
        let before = self.turns.len();
        self.turns.retain(|turn| !turn.classes.contains(TRANSIENT));
        let mut removed = before - self.turns.len();

        for turn in &mut self.turns {
            if turn
                .content
                .as_ref()
                .is_some_and(|c| c.content_classes.contains(TRANSIENT) || c.classes.contains(TRANSIENT))
            {
                turn.content = None;
                removed += 1;
            }
            if let Some(prompt) = &turn.prompt
                && let PromptInput::Command { classes, .. } = &prompt.input
                && classes.contains(TRANSIENT)
            {
                turn.prompt = None;
                removed += 1;
            }
        }
        removed
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            let _ = write!(out, "<div class=\"{}\">", turn.classes);
            if let Some(content) = &turn.content {
                let _ = write!(
                    out,
                    "<div class=\"{}\"><div{}>{}</div></div>",
                    content.classes,
                    class_attr(&content.content_classes),
                    content.html
                );
            }
            if let Some(prompt) = &turn.prompt {
                let _ = write!(out, "<span class=\"{}\">{}", prompt.classes, prompt.html);
                match &prompt.input {
                    PromptInput::Field { value } => {
                        let _ = write!(
                            out,
                            "<input type=\"text\" value=\"{}\">",
                            v_htmlescape::escape(value)
                        );
                    }
                    PromptInput::Command { html, classes } => {
                        let _ = write!(out, "<span class=\"{classes}\">{html}</span>");
                    }
                }
                out.push_str("</span>");
            }
            out.push_str("</div>");
        }
        out
    }
}

fn with_class(first: &str, rest: &ClassList) -> ClassList {
    let mut classes = ClassList::parse(first);
    for class in rest.iter() {
        classes.add(class);
    }
    classes
}

fn class_attr(classes: &ClassList) -> String {
    if classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{classes}\"")
    }
}
