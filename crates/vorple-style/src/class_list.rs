#![forbid(unsafe_code)]

//! An ordered, duplicate-free list of CSS class names.
//!
//! Mirrors the semantics of a DOM `classList`: adding an existing class is a
//! no-op and keeps its position, removing a missing class is a no-op.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ClassList {
    classes: Vec<String>,
}

impl ClassList {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            classes: Vec::new(),
        }
    }

    /// Parse a `class` attribute value.
    #[must_use]
    pub fn parse(attr: &str) -> Self {
        let mut list = Self::new();
        for class in attr.split_ascii_whitespace() {
            list.add(class);
        }
        list
    }

    pub fn add(&mut self, class: &str) {
        if !class.is_empty() && !self.contains(class) {
            self.classes.push(class.to_owned());
        }
    }

    /// Returns true if the class was present.
    pub fn remove(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        before != self.classes.len()
    }

    /// Add the class when `on` is true, remove it otherwise.
    pub fn toggle(&mut self, class: &str, on: bool) {
        if on {
            self.add(class);
        } else {
            self.remove(class);
        }
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.classes.retain(|c| keep(c));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.classes.join(" "))
    }
}

impl<'a> FromIterator<&'a str> for ClassList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut list = Self::new();
        for class in iter {
            list.add(class);
        }
        list
    }
}

/// True for `textcolor-N` and `bgcolor-N` classes.
#[must_use]
pub fn is_color_class(class: &str) -> bool {
    let digits = class
        .strip_prefix("textcolor-")
        .or_else(|| class.strip_prefix("bgcolor-"));
    digits.is_some_and(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
}
