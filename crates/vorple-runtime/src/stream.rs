#![forbid(unsafe_code)]

//! Open-tag stacks for routing output into story-created elements.
//!
//! Opening a tag writes its start tag into the window's HTML stream; every
//! flush after that lands inside it until the tag is closed. Each window has
//! its own stack.

use ahash::AHashMap;
use vorple_core::IdGenerator;

/// A tag that was just opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedTag {
    pub id: String,
    /// The start tag to write into the window.
    pub html: String,
    /// Id of the enclosing open tag; `None` at window level.
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Open {
    id: String,
    tag: String,
}

#[derive(Debug, Default)]
pub struct TagStack {
    windows: AHashMap<usize, Vec<Open>>,
}

fn is_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl TagStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a tag. Returns `None` for an invalid tag name.
    pub fn open_tag(
        &mut self,
        tag: &str,
        classes: &str,
        window: usize,
        ids: &mut IdGenerator,
    ) -> Option<OpenedTag> {
        if !is_tag_name(tag) {
            return None;
        }
        let tag = tag.to_ascii_lowercase();
        let id = ids.generate();
        let stack = self.windows.entry(window).or_default();
        let parent = stack.last().map(|open| open.id.clone());

        let classes = classes.split_whitespace().collect::<Vec<_>>().join(" ");
        let html = if classes.is_empty() {
            format!("<{tag} id=\"{id}\">")
        } else {
            format!(
                "<{tag} id=\"{id}\" class=\"{}\">",
                v_htmlescape::escape(&classes)
            )
        };

        stack.push(Open {
            id: id.clone(),
            tag,
        });
        Some(OpenedTag { id, html, parent })
    }

    /// Close the innermost open tag and return its end tag, or `None` when
    /// output is already at window level.
    pub fn close_tag(&mut self, window: usize) -> Option<String> {
        let open = self.windows.get_mut(&window)?.pop()?;
        Some(format!("</{}>", open.tag))
    }

    /// End tags for every open tag of a window, innermost first.
    pub fn close_all_tags(&mut self, window: usize) -> String {
        self.windows
            .remove(&window)
            .unwrap_or_default()
            .into_iter()
            .rev()
            .map(|open| format!("</{}>", open.tag))
            .collect()
    }

    /// Id of the element output currently goes into.
    #[must_use]
    pub fn stream(&self, window: usize) -> Option<&str> {
        self.windows
            .get(&window)
            .and_then(|stack| stack.last())
            .map(|open| open.id.as_str())
    }

    #[must_use]
    pub fn depth(&self, window: usize) -> usize {
        self.windows.get(&window).map_or(0, Vec::len)
    }
}
