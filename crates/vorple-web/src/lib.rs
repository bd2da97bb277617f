#![forbid(unsafe_code)]

//! `vorple-web` is the DOM-side bridge for the Vorple runtime.
//!
//! Design goals:
//! - **Host-driven I/O**: the JS shim pushes page events and engine output
//!   in as [`HostEvent`]s and drains engine calls and [`WebOutputs`].
//! - **No DOM bindings**: windows and the transcript are plain strings and
//!   blocks the shim copies into the page.
//! - **Swappable turn parsing**: the engine's turn markup is read through
//!   the [`TurnParser`] trait.
//!
//! The main window of the [`WebSurface`] plays the part of the engine's own
//! output buffer. At the end of each turn [`WebRuntime`] takes its HTML,
//! splits it with the turn parser, runs it through the session, and renders
//! the result into the [`Transcript`]. The buffer always starts with one
//! command line; when the engine doesn't echo one (the first turn, and every
//! turn after a char turn) an empty line stands in for it.

pub mod fragment;
#[cfg(feature = "input-parser")]
pub mod input_parser;
pub mod transcript;
pub mod turn_parser;

use std::collections::VecDeque;

use vorple_backend::{EngineBridge, EngineCall, Host, OutputSurface};
use vorple_core::{Event, KeyCode, VorpleError};
use vorple_runtime::{
    CommandOptions, KeyDispatch, Notification, Session, SessionConfig, TurnMode, TurnOutcome,
    TurnStructure,
};

pub use fragment::{Element, Fragment, FragmentError, Node};
#[cfg(feature = "input-parser")]
pub use input_parser::{EventParseError, parse_encoded_event};
pub use transcript::{ContentBlock, PromptBlock, PromptInput, Transcript, TurnBlock};
pub use turn_parser::{FragmentTurnParser, TurnParser};

/// Engine side of the web host. Calls wait here until the shim drains them
/// into the interpreter.
#[derive(Debug, Default, Clone)]
pub struct WebEngine {
    pending: VecDeque<EngineCall>,
}

impl WebEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain all pending calls, oldest first.
    pub fn drain_calls(&mut self) -> impl Iterator<Item = EngineCall> + '_ {
        self.pending.drain(..)
    }
}

impl EngineBridge for WebEngine {
    fn send_line(&mut self, line: &str) {
        self.pending.push_back(EngineCall::Line(line.to_owned()));
    }

    fn send_char(&mut self, code: KeyCode) {
        self.pending.push_back(EngineCall::Char(code));
    }
}

/// Window contents as HTML, with line breaks as `<br>`.
#[derive(Debug, Clone)]
pub struct WebSurface {
    windows: Vec<String>,
}

impl Default for WebSurface {
    /// Main window and status line.
    fn default() -> Self {
        Self::with_windows(2)
    }
}

impl WebSurface {
    #[must_use]
    pub fn with_windows(count: usize) -> Self {
        Self {
            windows: vec![String::new(); count],
        }
    }

    /// Open another window and return its index.
    pub fn add_window(&mut self) -> usize {
        self.windows.push(String::new());
        self.windows.len() - 1
    }

    #[must_use]
    pub fn window(&self, window: usize) -> Option<&str> {
        self.windows.get(window).map(String::as_str)
    }

    /// Take a window's contents, leaving it empty.
    pub fn take(&mut self, window: usize) -> String {
        self.windows
            .get_mut(window)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

impl OutputSurface for WebSurface {
    fn has_window(&self, window: usize) -> bool {
        window < self.windows.len()
    }

    fn append(&mut self, window: usize, html: &str) {
        if let Some(contents) = self.windows.get_mut(window) {
            contents.push_str(&html.replace('\n', "<br>"));
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct WebHost {
    pub engine: WebEngine,
    pub surface: WebSurface,
}

impl Host for WebHost {
    type Engine = WebEngine;
    type Surface = WebSurface;

    fn engine(&mut self) -> &mut WebEngine {
        &mut self.engine
    }

    fn surface(&mut self) -> &mut WebSurface {
        &mut self.surface
    }
}

/// An event pushed in by the page or the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// `init.vorple`: the interpreter is loaded.
    Init,
    /// A keypress, click, or scroll on the page.
    Page(Event),
    /// The engine accepted a line of input.
    TextInput,
    /// The engine finished a turn and waits for input.
    TurnComplete { mode: TurnMode },
    /// A click on an `a.commandLink`.
    CommandLink {
        command: String,
        hide_command: bool,
        hide_output: bool,
    },
    /// The player pressed enter in the prompt.
    Submit { text: String },
    /// Engine output for a window.
    Print { text: String, window: usize },
}

/// Everything the shim has to act on after handling events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WebOutputs {
    pub outcomes: Vec<TurnOutcome>,
    pub notifications: Vec<Notification>,
    /// Messages for the in-page error display.
    pub errors: Vec<String>,
    pub dispatches: Vec<KeyDispatch>,
    /// An end-of-game keypress asked to leave the page.
    pub navigate: Option<String>,
}

/// A [`Session`] wired to a [`WebHost`], a turn parser, and a transcript.
pub struct WebRuntime {
    session: Session<WebHost>,
    parser: Box<dyn TurnParser>,
    transcript: Transcript,
    outputs: WebOutputs,
}

impl std::fmt::Debug for WebRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRuntime")
            .field("session", &self.session)
            .field("turns", &self.transcript.len())
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl WebRuntime {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_parser(config, FragmentTurnParser)
    }

    pub fn with_parser(config: SessionConfig, parser: impl TurnParser + 'static) -> Self {
        let mut host = WebHost::default();
        host.surface.append(0, "\n");
        Self {
            session: Session::new(host, config),
            parser: Box::new(parser),
            transcript: Transcript::new(),
            outputs: WebOutputs::default(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session<WebHost> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<WebHost> {
        &mut self.session
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn outputs(&self) -> &WebOutputs {
        &self.outputs
    }

    pub fn take_outputs(&mut self) -> WebOutputs {
        std::mem::take(&mut self.outputs)
    }

    /// Engine calls for the interpreter, oldest first.
    pub fn drain_engine_calls(&mut self) -> Vec<EngineCall> {
        self.session.host_mut().engine.drain_calls().collect()
    }

    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::Init => self.session.start(),
            HostEvent::Page(event) => {
                let dispatch = self.session.send_key(event);
                if let KeyDispatch::Exit(url) = &dispatch {
                    self.outputs.navigate.clone_from(url);
                }
                self.outputs.dispatches.push(dispatch);
            }
            HostEvent::TextInput => {
                self.session.text_input();
                let removed = self.transcript.clear_transient();
                tracing::trace!(target: "vorple.web", removed, "transient blocks cleared");
            }
            HostEvent::TurnComplete { mode } => {
                let outcome = self.complete_turn(mode);
                self.outputs.outcomes.push(outcome);
            }
            HostEvent::CommandLink {
                command,
                hide_command,
                hide_output,
            } => {
                tracing::debug!(target: "vorple.web", %command, hide_command, hide_output, "command link");
                let options = CommandOptions::default()
                    .hide_command(hide_command)
                    .hide_output(hide_output)
                    .user_action(true);
                self.session.send_command(command, options);
            }
            HostEvent::Submit { text } => self.session.submit_line(text),
            HostEvent::Print { text, window } => self.session.print(&text, window),
        }
        self.collect();
    }

    /// Decode and handle one JSON page event. Returns false for kinds the
    /// runtime ignores.
    #[cfg(feature = "input-parser")]
    pub fn handle_encoded(&mut self, json: &str) -> Result<bool, EventParseError> {
        match parse_encoded_event(json)? {
            Some(event) => {
                self.handle(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deliver engine calls whose deferred hooks have settled.
    pub fn pump(&mut self) -> usize {
        let delivered = self.session.pump();
        self.collect();
        delivered
    }

    fn complete_turn(&mut self, mode: TurnMode) -> TurnOutcome {
        let _span = tracing::debug_span!("vorple.web.turn", mode = ?mode).entered();

        self.session.flush_all();
        let html = self.session.host_mut().surface.take(0);
        let structure = match self.parser.parse(&html, mode) {
            Ok(structure) => structure,
            Err(err) => {
                self.session.report(&VorpleError::EngineOutput {
                    output: err.to_string(),
                });
                TurnStructure {
                    content: html,
                    ..TurnStructure::default()
                }
            }
        };
        if mode == TurnMode::Char {
            self.session.host_mut().surface.append(0, "\n");
        }

        let outcome = self.session.complete_turn(structure, mode);
        if let TurnOutcome::Rendered(rendered) = &outcome {
            self.transcript.render(rendered);
        }
        outcome
    }

    fn collect(&mut self) {
        self.outputs
            .notifications
            .extend(self.session.take_notifications());
        self.outputs.errors.extend(self.session.take_errors());
    }
}
