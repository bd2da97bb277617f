#![forbid(unsafe_code)]

//! Core: host events, options, versioning, and the shared error taxonomy.
//!
//! # Role in Vorple
//! `vorple-core` is the input layer. It owns the canonical event types that
//! the host page pushes in (keys, clicks, viewport changes), the option set
//! resolved from the page URL, and the error values every other crate reports.
//!
//! # Primary responsibilities
//! - **Event**: canonical input events with DOM key codes and modifier flags.
//! - **Options**: URL query resolution with typed coercion, plus file loading.
//! - **Version checks**: `require_version` and `require_release`.
//! - **Ids**: random element ids for generated tags and anonymous filters.
//!
//! # How it fits in the system
//! The runtime (`vorple-runtime`) consumes `vorple-core::Event` values and
//! drives the session state. The web bridge (`vorple-web`) decodes host JSON
//! into these same types, so `vorple-core` is the shared vocabulary between
//! the page and the turn pipeline.

pub mod error;
pub mod event;
pub mod id;
pub mod options;
pub mod version;

pub use error::{Result, VorpleError};
pub use event::{ClickEvent, Event, KeyCode, KeyEvent, Modifiers};
pub use id::IdGenerator;
pub use options::{OptionValue, Options, OptionsError, ParamType, get_parameter};
pub use version::{
    ReleaseRange, VERSION, require_release, require_version, require_version_at, version_satisfies,
};
