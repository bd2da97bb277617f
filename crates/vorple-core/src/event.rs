#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! This module defines the events the host page forwards into the runtime.
//! All events derive `Clone`, `PartialEq`, and `Eq` for use in tests and
//! pattern matching.
//!
//! # Design Notes
//!
//! - Key codes are DOM `keyCode` values, which is what story engines expect
//!   from `sendChar`.
//! - `forced` marks synthetic events (replayed from the key buffer or queued
//!   by story code). Forced events are delivered even when the page is
//!   scrolled away from the prompt.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A `keydown` on the page.
    Key(KeyEvent),

    /// A `click` anywhere on the page.
    Click(ClickEvent),

    /// The page scrolled.
    ///
    /// `at_bottom` is true when the prompt is within reach of the viewport.
    Viewport {
        /// Whether the viewport currently shows the bottom of the page.
        at_bottom: bool,
    },
}

impl Event {
    /// Modifier keys held during the event, if it carries any.
    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        match self {
            Self::Key(key) => key.modifiers,
            Self::Click(click) => click.modifiers,
            Self::Viewport { .. } => Modifiers::NONE,
        }
    }

    /// True for synthetic events that bypass the scroll check.
    #[must_use]
    pub const fn is_forced(&self) -> bool {
        match self {
            Self::Key(key) => key.forced,
            Self::Click(_) | Self::Viewport { .. } => false,
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Synthetic event that must not be swallowed by the scroll check.
    pub forced: bool,
}

impl KeyEvent {
    /// Create a new key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            forced: false,
        }
    }

    /// Create a forced (synthetic) key event.
    #[must_use]
    pub const fn forced(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            forced: true,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Meta/Cmd modifier is held.
    #[must_use]
    pub const fn meta(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }
}

/// A mouse click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickEvent {
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The click landed on an input or a link, which handle it themselves.
    pub on_control: bool,
}

impl ClickEvent {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modifiers: Modifiers::NONE,
            on_control: false,
        }
    }
}

/// A DOM `keyCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const BACKSPACE: Self = Self(8);
    pub const TAB: Self = Self(9);
    pub const ENTER: Self = Self(13);
    pub const ESCAPE: Self = Self(27);
    pub const SPACE: Self = Self(32);
    pub const LEFT: Self = Self(37);
    pub const UP: Self = Self(38);
    pub const RIGHT: Self = Self(39);
    pub const DOWN: Self = Self(40);
    pub const DELETE: Self = Self(46);

    /// The code a story engine receives for a character, which is its code
    /// point.
    #[must_use]
    pub const fn from_char(ch: char) -> Self {
        Self(ch as u32)
    }

    /// The character this code stands for, if it is printable.
    #[must_use]
    pub fn as_char(self) -> Option<char> {
        char::from_u32(self.0).filter(|ch| !ch.is_control())
    }
}

impl From<char> for KeyCode {
    fn from(ch: char) -> Self {
        Self::from_char(ch)
    }
}

bitflags! {
    /// Modifier keys that can be held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Meta/Command key.
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

impl Modifiers {
    /// Build the flag set from the four DOM event booleans.
    #[must_use]
    pub fn from_dom(alt: bool, ctrl: bool, meta: bool, shift: bool) -> Self {
        let mut mods = Self::NONE;
        mods.set(Self::ALT, alt);
        mods.set(Self::CTRL, ctrl);
        mods.set(Self::META, meta);
        mods.set(Self::SHIFT, shift);
        mods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_modifiers() {
        let event = KeyEvent::new(KeyCode::from_char('c')).with_modifiers(Modifiers::CTRL);
        assert!(event.ctrl());
        assert!(!event.alt());
        assert!(!event.shift());
        assert!(!event.meta());
    }

    #[test]
    fn key_event_combined_modifiers() {
        let event = KeyEvent::new(KeyCode::from_char('s'))
            .with_modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        assert!(event.ctrl());
        assert!(event.shift());
        assert!(!event.alt());
    }

    #[test]
    fn forced_events_are_flagged() {
        assert!(Event::Key(KeyEvent::forced(KeyCode::ENTER)).is_forced());
        assert!(!Event::Key(KeyEvent::new(KeyCode::ENTER)).is_forced());
        assert!(!Event::Click(ClickEvent::new()).is_forced());
    }

    #[test]
    fn modifiers_from_dom_booleans() {
        assert_eq!(Modifiers::from_dom(false, false, false, false), Modifiers::NONE);
        assert_eq!(
            Modifiers::from_dom(true, false, true, false),
            Modifiers::ALT | Modifiers::META
        );
    }

    #[test]
    fn event_modifiers_accessor() {
        let click = ClickEvent {
            modifiers: Modifiers::SHIFT,
            on_control: false,
        };
        assert_eq!(Event::Click(click).modifiers(), Modifiers::SHIFT);
        assert_eq!(Event::Viewport { at_bottom: true }.modifiers(), Modifiers::NONE);
    }

    #[test]
    fn key_code_chars() {
        assert_eq!(KeyCode::from_char('A'), KeyCode(65));
        assert_eq!(KeyCode(65).as_char(), Some('A'));
        assert_eq!(KeyCode::ENTER.as_char(), None);
    }

    #[test]
    fn modifiers_default() {
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }
}
