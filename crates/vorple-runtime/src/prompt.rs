#![forbid(unsafe_code)]

//! State of the command prompt.
//!
//! The host owns the actual input element; this is what the runtime wants
//! it to look like.

use vorple_style::ClassList;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptState {
    /// Current contents of the input field.
    pub value: String,
    /// HTML shown before the input, e.g. `&gt;`.
    pub prefix: String,
    pub hidden: bool,
    /// Style classes of the input field.
    pub classes: ClassList,
}

impl PromptState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: "&gt;".to_owned(),
            ..Self::default()
        }
    }

    /// Set the prefix. Plain text is escaped; `is_html` keeps it as is.
    /// Returns the prefix as stored.
    pub fn set_prefix(&mut self, prefix: &str, is_html: bool) -> &str {
        self.prefix = if is_html {
            prefix.to_owned()
        } else {
            v_htmlescape::escape(prefix).to_string()
        };
        &self.prefix
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Take the current value, leaving the field empty.
    pub fn take_value(&mut self) -> String {
        std::mem::take(&mut self.value)
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    pub fn unhide(&mut self) {
        self.hidden = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prefixes_are_escaped() {
        let mut prompt = PromptState::new();
        assert_eq!(prompt.prefix, "&gt;");
        assert_eq!(prompt.set_prefix("<you>", false), "&lt;you&gt;");
        assert_eq!(prompt.set_prefix("<b>?</b>", true), "<b>?</b>");
    }

    #[test]
    fn hide_and_unhide() {
        let mut prompt = PromptState::new();
        prompt.hide();
        assert!(prompt.hidden);
        prompt.unhide();
        assert!(!prompt.hidden);
    }
}
