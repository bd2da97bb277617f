#![forbid(unsafe_code)]

//! Splitting a rendered engine turn into its parts.
//!
//! # Role in Vorple
//! When the engine finishes a turn its main window holds the echoed command,
//! the turn's output, and the new prompt, all as one run of HTML. The
//! [`TurnParser`] pulls those apart into a [`TurnStructure`] for the output
//! filters. It is a trait so a different engine front end can bring its own
//! parser when its markup differs.
//!
//! # Grammar
//!
//! [`FragmentTurnParser`] accepts:
//!
//! ```text
//! fragment  := container prompt?
//! container := "<span>" command? "<br>" content "</span>"
//! prompt    := "<span>" "<br>"? prompt-text "<input" attrs ">" "</span>"
//! ```
//!
//! Bare text in place of the spans is accepted too, which is what the
//! [`WebSurface`](crate::WebSurface) produces.
//!
//! - The command is everything before the first `<br>` of the first
//!   container. That break is removed with it; if it is the first node, the
//!   command is empty.
//! - In line mode the prompt is the first text node of the final container,
//!   or bare trailing text that follows a `<br>`.
//!   A `<br>` inside that container moves to the end of the preceding
//!   sibling and the container is removed.
//! - In char mode the prompt is empty and nothing after the command is
//!   touched.
//! - `<input>` elements are always dropped.

use vorple_runtime::{TurnMode, TurnStructure};

use crate::fragment::{Element, Fragment, FragmentError, Node};

pub trait TurnParser {
    fn parse(&self, html: &str, mode: TurnMode) -> Result<TurnStructure, FragmentError>;
}

/// Parser for the engine's span-per-line markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentTurnParser;

impl FragmentTurnParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TurnParser for FragmentTurnParser {
    fn parse(&self, html: &str, mode: TurnMode) -> Result<TurnStructure, FragmentError> {
        let mut fragment = Fragment::parse(html)?;
        fragment.remove_elements("input");

        let has_prompt = fragment.nodes.len() > 1;
        let previous_command = take_command(&mut fragment.nodes);
        let prompt = match mode {
            TurnMode::Line if has_prompt => take_prompt(&mut fragment.nodes),
            TurnMode::Line | TurnMode::Char => String::new(),
        };

        tracing::trace!(
            target: "vorple.web",
            command = %previous_command,
            prompt = %prompt,
            "turn parsed"
        );
        Ok(TurnStructure {
            previous_command: escape(&previous_command),
            content: fragment.to_html(),
            prompt: escape(&prompt),
        })
    }
}

fn escape(text: &str) -> String {
    v_htmlescape::escape(text).to_string()
}

fn is_container(node: &Node) -> bool {
    node.as_element().is_some_and(|el| !el.is_void())
}

fn take_command(nodes: &mut Vec<Node>) -> String {
    let Some(first) = nodes.first_mut() else {
        return String::new();
    };
    if !is_container(first) {
        return take_line(nodes);
    }
    let Some(container) = first.as_element_mut() else {
        return String::new();
    };
    let command = take_line(&mut container.children);
    if container.children.is_empty() {
        nodes.remove(0);
    }
    command
}

/// Remove and return the text before the first `<br>`, and the break.
fn take_line(nodes: &mut Vec<Node>) -> String {
    let Some(br) = nodes.iter().position(|node| node.is_element("br")) else {
        return String::new();
    };
    let command = nodes.drain(..br).map(|node| node.text_content()).collect();
    nodes.remove(0);
    command
}

fn take_prompt(nodes: &mut Vec<Node>) -> String {
    let Some(last) = nodes.pop() else {
        return String::new();
    };
    let container = match last {
        Node::Text(text) if nodes.last().is_some_and(|prev| prev.is_element("br")) => return text,
        Node::Text(text) => {
            nodes.push(Node::Text(text));
            return String::new();
        }
        Node::Element(el) if el.is_void() => {
            nodes.push(Node::Element(el));
            return String::new();
        }
        Node::Element(el) => el,
    };

    let prompt = first_text(&container).unwrap_or_default().to_owned();
    if contains_break(&container) {
        match nodes.last_mut() {
            Some(Node::Element(prev)) if !prev.is_void() => {
                prev.children.push(Node::Element(Element::new("br")));
            }
            _ => nodes.push(Node::Element(Element::new("br"))),
        }
    }
    prompt
}

fn first_text(el: &Element) -> Option<&str> {
    el.children.iter().find_map(|child| match child {
        Node::Text(text) => Some(text.as_str()),
        Node::Element(inner) => first_text(inner),
    })
}

fn contains_break(el: &Element) -> bool {
    el.children.iter().any(|child| match child {
        Node::Element(inner) => inner.tag == "br" || contains_break(inner),
        Node::Text(_) => false,
    })
}
