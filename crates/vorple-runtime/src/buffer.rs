#![forbid(unsafe_code)]

//! Per-window output buffering.
//!
//! Engine output arrives a few characters at a time. It is HTML-encoded into
//! a pending buffer per window and handed to the [`OutputSurface`] on flush.
//! Complete lines are flushed as soon as they are appended; a partial line
//! waits for the next break, an explicit flush, or a style change.
//!
//! Flushing an empty buffer, or a window the surface doesn't have, does
//! nothing and leaves the pending text where it is.

use std::fmt;

use ahash::AHashMap;
use vorple_backend::OutputSurface;

/// Font state passed to the text filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
}

type TextFilter = Box<dyn FnMut(&str, TextStyle) -> Option<String>>;

/// Encode engine text for insertion as HTML.
///
/// `&`, `<` and `>` become entities, `\r` becomes `\n`, and anything above
/// ASCII becomes a numeric character reference.
#[must_use]
pub fn encode_html(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '\r' => encoded.push('\n'),
            c if u32::from(c) > 127 => {
                encoded.push_str("&#");
                encoded.push_str(&u32::from(c).to_string());
                encoded.push(';');
            }
            c => encoded.push(c),
        }
    }
    encoded
}

#[derive(Default)]
pub struct OutputBuffer {
    pending: AHashMap<usize, String>,
    text_filter: Option<TextFilter>,
    text_printed: bool,
}

impl fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("pending", &self.pending)
            .field("text_filter", &self.text_filter.is_some())
            .field("text_printed", &self.text_printed)
            .finish()
    }
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a filter over main-window output. Returning `None` keeps the
    /// text as it was.
    pub fn set_text_filter<F>(&mut self, filter: F)
    where
        F: FnMut(&str, TextStyle) -> Option<String> + 'static,
    {
        self.text_filter = Some(Box::new(filter));
    }

    pub fn clear_text_filter(&mut self) {
        self.text_filter = None;
    }

    /// Pending, not yet flushed HTML for a window.
    #[must_use]
    pub fn pending(&self, window: usize) -> &str {
        self.pending.get(&window).map_or("", String::as_str)
    }

    /// Whether window 0 received output since the flag was last taken.
    #[must_use]
    pub const fn text_was_printed(&self) -> bool {
        self.text_printed
    }

    /// Read and clear the printed flag.
    pub fn take_text_printed(&mut self) -> bool {
        std::mem::take(&mut self.text_printed)
    }

    /// Buffer text, flushing up to and including its last line break.
    pub fn append(
        &mut self,
        text: &str,
        window: usize,
        surface: &mut impl OutputSurface,
        style: TextStyle,
    ) {
        match text.rfind(['\n', '\r']) {
            Some(last_break) => {
                let (complete, rest) = text.split_at(last_break + 1);
                self.pending
                    .entry(window)
                    .or_default()
                    .push_str(&encode_html(complete));
                self.flush(window, surface, style);
                self.pending
                    .entry(window)
                    .or_default()
                    .push_str(&encode_html(rest));
            }
            None => self
                .pending
                .entry(window)
                .or_default()
                .push_str(&encode_html(text)),
        }
    }

    pub fn newline(&mut self, window: usize, surface: &mut impl OutputSurface, style: TextStyle) {
        self.pending.entry(window).or_default().push('\n');
        self.flush(window, surface, style);
    }

    /// Hand a window's pending text to the surface.
    ///
    /// Returns true when something was written.
    pub fn flush(&mut self, window: usize, surface: &mut impl OutputSurface, style: TextStyle) -> bool {
        let Some(pending) = self.pending.get_mut(&window) else {
            return false;
        };
        if pending.is_empty() || !surface.has_window(window) {
            return false;
        }

        let mut output = std::mem::take(pending);
        if window == 0
            && let Some(filter) = self.text_filter.as_mut()
            && let Some(filtered) = filter(&output, style)
        {
            output = filtered;
        }

        tracing::trace!(target: "vorple.buffer", window, bytes = output.len(), "flush");
        surface.append(window, &output);
        if window == 0 {
            self.text_printed = true;
        }
        true
    }

    /// Flush every window. `style_of` gives each window's font state.
    pub fn flush_all(
        &mut self,
        surface: &mut impl OutputSurface,
        mut style_of: impl FnMut(usize) -> TextStyle,
    ) {
        let mut windows: Vec<usize> = self.pending.keys().copied().collect();
        windows.sort_unstable();
        for window in windows {
            self.flush(window, surface, style_of(window));
        }
    }
}
