#![forbid(unsafe_code)]

//! A small owned HTML fragment model.
//!
//! # Role in Vorple
//! The engine renders each turn into a window as HTML. The turn parser needs
//! to pick that HTML apart node by node (the echoed command, the content, the
//! prompt container) without a browser. [`Fragment`] is the tree it works on.
//!
//! # Design
//! Only the subset of HTML the engine and the tag streams produce is
//! accepted: elements with quoted, unquoted or bare attributes, void
//! elements, comments (dropped), and text with character references.
//! Text nodes hold decoded text; [`Fragment::to_html`] escapes it again with
//! `v_htmlescape`, so a parse/serialise cycle is stable but not byte-exact.
//!
//! # Failure Modes
//! Unbalanced markup is an error rather than being repaired: a close tag
//! with no matching open element, an element still open at the end, or a
//! tag cut off by the end of input. The caller decides what to do with the
//! raw HTML in that case.

use std::fmt;
use std::str::FromStr;

use vorple_style::ClassList;

/// Elements that never have children or a close tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("tag starting at byte {offset} is never terminated")]
    UnterminatedTag { offset: usize },

    #[error("comment starting at byte {offset} is never terminated")]
    UnterminatedComment { offset: usize },

    #[error("close tag </{tag}> at byte {offset} has no matching open element")]
    UnmatchedClose { tag: String, offset: usize },

    #[error("<{tag}> opened at byte {offset} is never closed")]
    Unclosed { tag: String, offset: usize },

    #[error("invalid tag name at byte {offset}")]
    InvalidTagName { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Whether this is an element with the given (lowercase) tag.
    #[must_use]
    pub fn is_element(&self, tag: &str) -> bool {
        matches!(self, Self::Element(el) if el.tag == tag)
    }

    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// Visible text, with `<br>` as a line break.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(el) if el.tag == "br" => out.push('\n'),
            Self::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(&v_htmlescape::escape(text).to_string()),
            Self::Element(el) => el.write_html(out),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes in source order. Bare attributes have an empty value.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
    }

    #[must_use]
    pub fn classes(&self) -> ClassList {
        self.attr("class").map(ClassList::parse).unwrap_or_default()
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&v_htmlescape::escape(value).to_string());
                out.push('"');
            }
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// A parsed run of sibling nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn parse(html: &str) -> Result<Self, FragmentError> {
        Parser::new(html).run()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }

    /// Visible text, with `<br>` as a line break.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.collect_text(&mut out);
        }
        out
    }

    /// Remove every element with this tag, at any depth. Returns how many
    /// were removed.
    pub fn remove_elements(&mut self, tag: &str) -> usize {
        remove_from(&mut self.nodes, tag)
    }
}

fn remove_from(nodes: &mut Vec<Node>, tag: &str) -> usize {
    let before = nodes.len();
    nodes.retain(|node| !node.is_element(tag));
    let mut removed = before - nodes.len();
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            removed += remove_from(&mut el.children, tag);
        }
    }
    removed
}

impl FromStr for Fragment {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Decode the character references the engine and browsers emit. Unknown
/// references are kept as written.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let ch = decode_reference(&rest[1..semi])?;
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Open elements with the offset of their start tag.
    stack: Vec<(Element, usize)>,
    root: Vec<Node>,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            stack: Vec::new(),
            root: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Fragment, FragmentError> {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            if rest.starts_with("<!--") {
                self.skip_comment()?;
            } else if rest.starts_with("</") {
                self.close_tag()?;
            } else if rest.len() > 1 && rest.as_bytes()[0] == b'<' && rest.as_bytes()[1].is_ascii_alphabetic() {
                self.open_tag()?;
            } else {
                self.text();
            }
        }
        if let Some((el, offset)) = self.stack.pop() {
            return Err(FragmentError::Unclosed {
                tag: el.tag,
                offset,
            });
        }
        Ok(Fragment { nodes: self.root })
    }

    fn children(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some((el, _)) => &mut el.children,
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: Node) {
        let children = self.children();
        if let (Node::Text(text), Some(Node::Text(prev))) = (&node, children.last_mut()) {
            prev.push_str(text);
            return;
        }
        children.push(node);
    }

    fn text(&mut self) {
        let rest = &self.src[self.pos..];
        // A '<' that doesn't start a tag is literal; always consume at least
        // the first character.
        let end = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '<')
            .map_or(rest.len(), |(i, _)| i);
        self.pos += end;
        self.push(Node::Text(decode_entities(&rest[..end])));
    }

    fn skip_comment(&mut self) -> Result<(), FragmentError> {
        let start = self.pos;
        let body = &self.src[start + 4..];
        let end = body
            .find("-->")
            .ok_or(FragmentError::UnterminatedComment { offset: start })?;
        self.pos = start + 4 + end + 3;
        Ok(())
    }

    fn open_tag(&mut self) -> Result<(), FragmentError> {
        let start = self.pos;
        let unterminated = FragmentError::UnterminatedTag { offset: start };
        let mut cursor = start + 1;
        let name = take_while(self.src, &mut cursor, |c| c.is_ascii_alphanumeric() || c == '-');
        let mut el = Element::new(name);
        let mut self_closing = false;

        loop {
            take_while(self.src, &mut cursor, char::is_whitespace);
            let rest = self.src.get(cursor..).unwrap_or("");
            if rest.is_empty() {
                return Err(unterminated);
            }
            if rest.starts_with("/>") {
                self_closing = true;
                cursor += 2;
                break;
            }
            if rest.starts_with('>') {
                cursor += 1;
                break;
            }
            if rest.starts_with('/') {
                cursor += 1;
                continue;
            }

            let attr = take_while(self.src, &mut cursor, |c| {
                !c.is_whitespace() && c != '=' && c != '>' && c != '/'
            })
            .to_ascii_lowercase();
            take_while(self.src, &mut cursor, char::is_whitespace);
            let value = if self.src[cursor..].starts_with('=') {
                cursor += 1;
                take_while(self.src, &mut cursor, char::is_whitespace);
                self.attr_value(&mut cursor).ok_or_else(|| unterminated.clone())?
            } else {
                String::new()
            };
            el.attrs.push((attr, value));
        }

        self.pos = cursor;
        if self_closing || el.is_void() {
            self.push(Node::Element(el));
        } else {
            self.stack.push((el, start));
        }
        Ok(())
    }

    fn attr_value(&self, cursor: &mut usize) -> Option<String> {
        let rest = self.src.get(*cursor..)?;
        let quote = rest.chars().next()?;
        if quote == '"' || quote == '\'' {
            let end = rest[1..].find(quote)?;
            *cursor += end + 2;
            return Some(decode_entities(&rest[1..=end]));
        }
        let raw = take_while(self.src, cursor, |c| !c.is_whitespace() && c != '>');
        Some(decode_entities(raw))
    }

    fn close_tag(&mut self) -> Result<(), FragmentError> {
        let start = self.pos;
        let rest = &self.src[start + 2..];
        let end = rest
            .find('>')
            .ok_or(FragmentError::UnterminatedTag { offset: start })?;
        let tag = rest[..end].trim().to_ascii_lowercase();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(FragmentError::InvalidTagName { offset: start });
        }
        self.pos = start + 2 + end + 1;

        if VOID_ELEMENTS.contains(&tag.as_str()) {
            return Ok(());
        }
        match self.stack.pop() {
            Some((el, _)) if el.tag == tag => {
                self.push(Node::Element(el));
                Ok(())
            }
            _ => Err(FragmentError::UnmatchedClose { tag, offset: start }),
        }
    }
}

fn take_while<'s>(src: &'s str, cursor: &mut usize, keep: impl Fn(char) -> bool) -> &'s str {
    let rest = src.get(*cursor..).unwrap_or("");
    let len = rest.find(|c: char| !keep(c)).unwrap_or(rest.len());
    *cursor += len;
    &rest[..len]
}
