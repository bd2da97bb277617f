#![forbid(unsafe_code)]

//! Runtime: the turn pipeline and everything it coordinates.
//!
//! # Role in Vorple
//! `vorple-runtime` turns page events into engine input and engine turns
//! into renderable output. It owns the input-mode machine, the command
//! queue, the filter pipeline, the output buffer, and the listener hooks,
//! all held by one [`Session`] per page.
//!
//! # How it fits in the system
//! The host implements [`vorple_backend::Host`] and drives the session:
//! page events go to [`Session::send_key`] and [`Session::submit_line`],
//! engine output to [`Session::print`], and the end of each engine turn to
//! [`Session::complete_turn`]. `vorple-web` provides such a host for the DOM;
//! [`vorple_backend::HeadlessHost`] is enough for tests.
//!
//! Nothing here blocks or spawns. Listener results that need time are
//! [`Deferred`] values, and the host calls [`Session::pump`] to deliver the
//! engine calls that were waiting on them.

pub mod buffer;
pub mod debug;
pub mod deferred;
pub mod eval;
pub mod filter;
pub mod input;
pub mod listeners;
pub mod prompt;
pub mod queue;
pub mod session;
pub mod stream;
pub mod turn;

pub use buffer::{OutputBuffer, TextStyle, encode_html};
pub use debug::Reporter;
pub use deferred::{Deferred, DeferredSource, deferred};
pub use eval::EvalQueue;
pub use filter::{
    FilterAction, FilterContext, FilterDirection, FilterFn, FilterHandle, FilterOptions,
    FilterOutcome, FilterRegistry,
};
pub use input::{InputMode, InputState, KeyDecision, KeyDispatch};
pub use listeners::{
    EventCategory, HookInput, HookMeta, HookResult, ListenerHandle, ListenerId, ListenerRegistry,
};
pub use prompt::PromptState;
pub use queue::{CommandOptions, CommandQueue, QueuedCommand};
pub use session::{START_STORY_COMMAND, Session, SessionConfig};
pub use stream::{OpenedTag, TagStack};
pub use turn::{
    MetaDecision, Notification, PromptPart, RenderedTurn, TextPart, TurnContent, TurnMode,
    TurnOutcome, TurnState, TurnStructure, TurnType, meta_stage, visible_text,
};
