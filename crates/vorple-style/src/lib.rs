#![forbid(unsafe_code)]

//! Style state for the Vorple runtime.
//!
//! # Role in Vorple
//! `vorple-style` tracks what the story engine asked text to look like, per
//! window, and turns that into CSS classes on output elements. It knows
//! nothing about buffering; callers pass a flush callback so that pending
//! text is written out before any state it was printed under changes.
//!
//! # This crate provides
//! - [`StyleTracker`] for per-window colours and font attributes.
//! - [`StyleHints`] for the Glk style table.
//! - [`ClassList`] for class reconciliation without a DOM.

/// Ordered class lists.
pub mod class_list;
/// Glk style hint table.
pub mod hints;
/// Per-window colour and font state.
pub mod tracker;

pub use class_list::{ClassList, is_color_class};
pub use hints::{GlkStyle, HintBundle, StyleHints};
pub use tracker::{
    ColorSlot, ColorState, FontAttr, FontFlags, FontState, StyleConfig, StyleSnapshot,
    StyleTracker,
};
