#![forbid(unsafe_code)]

//! Per-window colour and font state.
//!
//! Every window index lazily starts from documented defaults the first time
//! it is touched: the status line (window 1) is text colour 15 on background
//! 1, every other window is 7 on 0, and all fonts start proportional with no
//! emphasis.
//!
//! Any real state change calls the supplied `flush` callback for the window
//! *before* mutating, so pending output is never restyled retroactively.

use std::str::FromStr;

use ahash::AHashMap;
use bitflags::bitflags;

use crate::class_list::{ClassList, is_color_class};
use crate::hints::StyleHints;

bitflags! {
    /// Font attributes of a window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FontFlags: u8 {
        const BOLD         = 0b0001;
        const ITALIC       = 0b0010;
        const UNDERLINE    = 0b0100;
        const PROPORTIONAL = 0b1000;
    }
}

/// A single font attribute, as named by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontAttr {
    Bold,
    Italic,
    Underline,
    Proportional,
}

impl FontAttr {
    pub const ALL: [Self; 4] = [Self::Bold, Self::Italic, Self::Underline, Self::Proportional];

    #[must_use]
    pub const fn flag(self) -> FontFlags {
        match self {
            Self::Bold => FontFlags::BOLD,
            Self::Italic => FontFlags::ITALIC,
            Self::Underline => FontFlags::UNDERLINE,
            Self::Proportional => FontFlags::PROPORTIONAL,
        }
    }

    /// The CSS class carried by an element while the attribute is on.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Bold => "font-bold",
            Self::Italic => "font-italic",
            Self::Underline => "font-underline",
            Self::Proportional => "font-proportional",
        }
    }
}

impl FromStr for FontAttr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bold" => Ok(Self::Bold),
            "italic" => Ok(Self::Italic),
            "underline" => Ok(Self::Underline),
            "proportional" => Ok(Self::Proportional),
            other => Err(format!("unknown font attribute: {other}")),
        }
    }
}

/// Font state of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontState {
    pub flags: FontFlags,
    /// The engine's own font number, kept for save/restore.
    pub original: i32,
}

impl Default for FontState {
    fn default() -> Self {
        Self {
            flags: FontFlags::PROPORTIONAL,
            original: 0,
        }
    }
}

impl FontState {
    #[must_use]
    pub const fn has(&self, attr: FontAttr) -> bool {
        self.flags.contains(attr.flag())
    }
}

/// Which colour of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    Text,
    Background,
}

impl FromStr for ColorSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "background" => Ok(Self::Background),
            other => Err(format!("unknown colour slot: {other}")),
        }
    }
}

/// Colour indices of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorState {
    pub text: u32,
    pub background: u32,
}

impl ColorState {
    /// Defaults for a window index.
    #[must_use]
    pub const fn defaults(window: usize) -> Self {
        if window == 1 {
            Self {
                text: 15,
                background: 1,
            }
        } else {
            Self {
                text: 7,
                background: 0,
            }
        }
    }

    #[must_use]
    pub const fn get(&self, slot: ColorSlot) -> u32 {
        match slot {
            ColorSlot::Text => self.text,
            ColorSlot::Background => self.background,
        }
    }

    fn set(&mut self, slot: ColorSlot, value: u32) {
        match slot {
            ColorSlot::Text => self.text = value,
            ColorSlot::Background => self.background = value,
        }
    }
}

/// Which engine styling is honoured when classes are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleConfig {
    /// Emit `textcolor-N`/`bgcolor-N` classes.
    pub engine_colors: bool,
    /// Honour proportional/fixed-width font requests.
    pub engine_font_family: bool,
}

/// Saved colours or fonts, sorted by window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleSnapshot {
    pub colors: Vec<(usize, ColorState)>,
    pub fonts: Vec<(usize, FontState)>,
}

/// The style state of every window.
#[derive(Debug, Clone, Default)]
pub struct StyleTracker {
    config: StyleConfig,
    colors: AHashMap<usize, ColorState>,
    fonts: AHashMap<usize, FontState>,
    hints: StyleHints,
}

impl StyleTracker {
    #[must_use]
    pub fn new(config: StyleConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> StyleConfig {
        self.config
    }

    pub fn set_config(&mut self, config: StyleConfig) {
        self.config = config;
    }

    /// Current colours of a window, initialising it if needed.
    pub fn color(&mut self, window: usize) -> ColorState {
        *self.colors_mut(window)
    }

    /// Current font of a window, initialising it if needed.
    pub fn font(&mut self, window: usize) -> FontState {
        *self.fonts_mut(window)
    }

    fn colors_mut(&mut self, window: usize) -> &mut ColorState {
        self.colors
            .entry(window)
            .or_insert_with(|| ColorState::defaults(window))
    }

    fn fonts_mut(&mut self, window: usize) -> &mut FontState {
        self.fonts.entry(window).or_default()
    }

    /// Set a colour. An unchanged value does nothing, not even a flush.
    ///
    /// Returns true when the colour changed.
    pub fn set_color(
        &mut self,
        slot: ColorSlot,
        value: u32,
        window: usize,
        flush: impl FnOnce(usize),
    ) -> bool {
        let colors = self.colors_mut(window);
        if colors.get(slot) == value {
            return false;
        }

        flush(window);
        self.colors_mut(window).set(slot, value);
        tracing::trace!(target: "vorple.style", window, ?slot, value, "colour changed");
        true
    }

    /// Switch a font attribute on or off. Always flushes first.
    pub fn set_attr(&mut self, attr: FontAttr, on: bool, window: usize, flush: impl FnOnce(usize)) {
        flush(window);
        self.fonts_mut(window).flags.set(attr.flag(), on);
    }

    /// Record the engine's font number for a window.
    pub fn set_original_font(&mut self, window: usize, original: i32) {
        self.fonts_mut(window).original = original;
    }

    /// Apply a Glk style to the main window.
    ///
    /// Unknown styles are ignored.
    pub fn set_style_hint_style(&mut self, style: u32, mut flush: impl FnMut(usize)) {
        let Some(bundle) = self.hints.bundle(style).copied() else {
            tracing::trace!(target: "vorple.style", style, "ignoring unknown style");
            return;
        };

        for (attr, on) in bundle.changes() {
            self.set_attr(attr, on, 0, &mut flush);
        }
    }

    /// Change what a Glk style means.
    pub fn set_style_hint(&mut self, style: u32, hint: u32, value: i32) {
        self.hints.set_hint(style, hint, value);
    }

    #[must_use]
    pub fn hints(&self) -> &StyleHints {
        &self.hints
    }

    /// Reconcile the window's state onto an element's classes.
    ///
    /// Stale colour and font classes are removed before the current ones are
    /// added. For window 0 the same classes are mirrored onto the prompt
    /// input, when one is given.
    pub fn apply(&mut self, element: &mut ClassList, prompt: Option<&mut ClassList>, window: usize) {
        let colors = self.color(window);
        let font = self.font(window);
        let honour_family = self.config.engine_font_family;

        let mut new_classes: Vec<String> = Vec::new();
        if self.config.engine_colors {
            new_classes.push(format!("textcolor-{}", colors.text));
            new_classes.push(format!("bgcolor-{}", colors.background));
        }

        let attrs: Vec<FontAttr> = FontAttr::ALL
            .into_iter()
            .filter(|attr| honour_family || *attr != FontAttr::Proportional)
            .collect();

        for attr in &attrs {
            if font.has(*attr) {
                new_classes.push(attr.class_name().to_owned());
            }
        }
        if honour_family && !font.has(FontAttr::Proportional) {
            new_classes.push("font-fixed-width".to_owned());
        }

        let reconcile = |list: &mut ClassList| {
            list.retain(|class| !is_color_class(class) && class != "font-fixed-width");
            for attr in &attrs {
                list.remove(attr.class_name());
            }
            for class in &new_classes {
                list.add(class);
            }
        };

        reconcile(element);
        if window == 0
            && let Some(prompt) = prompt
        {
            reconcile(prompt);
        }
    }

    /// Save every initialised window.
    #[must_use]
    pub fn snapshot(&self) -> StyleSnapshot {
        let mut colors: Vec<_> = self.colors.iter().map(|(w, c)| (*w, *c)).collect();
        let mut fonts: Vec<_> = self.fonts.iter().map(|(w, f)| (*w, *f)).collect();
        colors.sort_by_key(|(w, _)| *w);
        fonts.sort_by_key(|(w, _)| *w);
        StyleSnapshot { colors, fonts }
    }

    /// Replace the colour state with a saved one.
    pub fn restore_colors(&mut self, snapshot: &StyleSnapshot) {
        self.colors = snapshot.colors.iter().copied().collect();
    }

    /// Replace the font state with a saved one.
    pub fn restore_fonts(&mut self, snapshot: &StyleSnapshot) {
        self.fonts = snapshot.fonts.iter().copied().collect();
    }
}
