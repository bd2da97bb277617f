#![forbid(unsafe_code)]

//! The session coordinator.
//!
//! # Role in Vorple
//! [`Session`] owns every piece of runtime state and is the only thing the
//! host talks to. The host pushes page events and engine signals in; the
//! session answers with dispatch results, turn outcomes, and calls into the
//! [`Host`]'s engine bridge and output surface.
//!
//! # Turn cycle
//!
//! ```text
//! send_command ─▶ queue ─▶ dispatch ─▶ input filters ─▶ submitCommand ─▶ engine
//!                   ▲                                                      │
//!                   │                                                      ▼
//!   expectCommand ◀─┴── complete_turn ◀── output filters ◀── meta stage ◀── turn
//! ```
//!
//! At most one command is in flight. Dispatch clears the interactive flag
//! and only a line turn's [`Session::complete_turn`] sets it again, after
//! which the queue is drained one entry at a time. Commands sent while the
//! engine waits for a key stay queued.
//!
//! # Deferred signals
//! When a submit listener returns an unsettled [`Deferred`], the engine call
//! it guards is parked. [`Session::pump`] delivers parked calls whose
//! deferreds have settled, oldest first. A parked call that never settles
//! holds back only itself.
//!
//! # Failure Modes
//! Configuration mistakes (unknown event names, unknown input modes, unknown
//! turn types), stray engine output, and failing story code all go to the
//! [`Reporter`]. The session keeps its current turn and queue state.

use std::collections::VecDeque;

use vorple_backend::{EngineBridge, Host, OutputSurface};
use vorple_core::{Event, IdGenerator, KeyCode, KeyEvent, Options, VorpleError};
use vorple_style::{ClassList, ColorSlot, FontAttr, StyleConfig, StyleSnapshot, StyleTracker};

use crate::buffer::{OutputBuffer, TextStyle};
use crate::debug::Reporter;
use crate::deferred::Deferred;
use crate::eval::EvalQueue;
use crate::filter::{FilterContext, FilterFn, FilterHandle, FilterOptions, FilterOutcome, FilterRegistry};
use crate::input::{InputMode, InputState, KeyDecision, KeyDispatch};
use crate::listeners::{EventCategory, HookInput, HookMeta, HookResult, ListenerHandle, ListenerId, ListenerRegistry};
use crate::prompt::PromptState;
use crate::queue::{CommandOptions, CommandQueue, QueuedCommand};
use crate::stream::TagStack;
use crate::turn::{
    MetaDecision, Notification, RenderedTurn, TurnContent, TurnMode, TurnOutcome, TurnState,
    TurnStructure, TurnType, meta_stage,
};

/// Command queued after the first turn of a story that announced Vorple
/// support.
pub const START_STORY_COMMAND: &str = "__start_story";

/// Construction options for a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub options: Options,
    pub style: StyleConfig,
    /// Start with story debugging on.
    pub debug: bool,
    /// Seed for generated ids; random when absent.
    pub id_seed: Option<u64>,
}

/// An engine call waiting for its hook results.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Signal {
    Line(String),
    Char(KeyCode),
}

#[derive(Debug)]
struct Parked {
    deferred: Deferred,
    signal: Signal,
}

fn text_style(style: &mut StyleTracker, window: usize) -> TextStyle {
    let font = style.font(window);
    TextStyle {
        bold: font.has(FontAttr::Bold),
        italic: font.has(FontAttr::Italic),
    }
}

pub struct Session<H: Host> {
    host: H,
    options: Options,
    input: InputState,
    key_queue: VecDeque<KeyCode>,
    buffer: OutputBuffer,
    style: StyleTracker,
    filters: FilterRegistry,
    listeners: ListenerRegistry,
    queue: CommandQueue,
    outbox: Vec<QueuedCommand>,
    turn: TurnState,
    prompt: PromptState,
    /// Input value to put back after a hidden command's turn.
    restore_prompt: Option<String>,
    evals: EvalQueue,
    tags: TagStack,
    reporter: Reporter,
    ids: IdGenerator,
    parked: VecDeque<Parked>,
    notifications: Vec<Notification>,
    interactive: bool,
    started: bool,
    first_turn_done: bool,
    vorple_story: bool,
}

impl<H: Host> std::fmt::Debug for Session<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.input.mode())
            .field("turn", &self.turn)
            .field("queued", &self.queue.len())
            .field("parked", &self.parked.len())
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Session<H> {
    pub fn new(host: H, config: SessionConfig) -> Self {
        let ids = config
            .id_seed
            .map_or_else(IdGenerator::new, IdGenerator::with_seed);
        let filter_ids = config
            .id_seed
            .map_or_else(IdGenerator::new, |seed| IdGenerator::with_seed(seed ^ 0x5eed));

        Self {
            host,
            options: config.options,
            input: InputState::new(),
            key_queue: VecDeque::new(),
            buffer: OutputBuffer::new(),
            style: StyleTracker::new(config.style),
            filters: FilterRegistry::with_ids(filter_ids),
            listeners: ListenerRegistry::new(),
            queue: CommandQueue::new(),
            outbox: Vec::new(),
            turn: TurnState::default(),
            prompt: PromptState::new(),
            restore_prompt: None,
            evals: EvalQueue::new(),
            tags: TagStack::new(),
            reporter: Reporter::new(config.debug),
            ids,
            parked: VecDeque::new(),
            notifications: Vec::new(),
            interactive: false,
            started: false,
            first_turn_done: false,
            vorple_story: false,
        }
    }

    /// The engine is loaded and about to run. Fires `init` once.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.input.start();
        tracing::debug!(target: "vorple.session", "session started");
        self.listeners
            .trigger(EventCategory::Init, &HookMeta::new(EventCategory::Init));
    }

    // ── accessors ──────────────────────────────────────────────────────

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn prompt(&self) -> &PromptState {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut PromptState {
        &mut self.prompt
    }

    pub fn style(&self) -> &StyleTracker {
        &self.style
    }

    pub fn set_style_config(&mut self, config: StyleConfig) {
        self.style.set_config(config);
    }

    /// Whether the engine is waiting for the next command.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn mode(&self) -> InputMode {
        self.input.mode()
    }

    /// Number of commands waiting to be dispatched.
    pub fn queued_commands(&self) -> usize {
        self.queue.len()
    }

    /// Number of engine calls waiting on deferred hook results.
    pub fn parked_signals(&self) -> usize {
        self.parked.len()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Error messages reported since the last call.
    pub fn take_errors(&mut self) -> Vec<String> {
        self.reporter.take_errors()
    }

    // ── command queue ──────────────────────────────────────────────────

    pub fn send_command(&mut self, text: impl Into<String>, options: CommandOptions) {
        self.queue.push(QueuedCommand::new(text, options));
        if self.interactive {
            self.run_command_queue();
        }
    }

    pub fn send_primary_command(&mut self, text: impl Into<String>, options: CommandOptions) {
        self.send_command(text, options.primary(true));
    }

    pub fn send_silent_command(&mut self, text: impl Into<String>) {
        self.send_command(text, CommandOptions::silent());
    }

    pub fn send_silent_primary_command(&mut self, text: impl Into<String>) {
        self.send_command(text, CommandOptions::silent().primary(true));
    }

    /// The player submitted the prompt.
    pub fn submit_line(&mut self, text: impl Into<String>) {
        self.send_command(text, CommandOptions::default().user_action(true));
    }

    /// Forget every queued command.
    pub fn clear_command_queue(&mut self) {
        self.queue.clear();
    }

    /// Dispatch queued commands while the engine is interactive.
    ///
    /// Returns true if a command reached the engine or was parked.
    pub fn run_command_queue(&mut self) -> bool {
        let mut dispatched = false;
        while self.interactive {
            let Some(command) = self.queue.next(&mut self.turn) else {
                break;
            };
            dispatched |= self.dispatch(command);
        }
        dispatched
    }

    fn dispatch(&mut self, command: QueuedCommand) -> bool {
        let _span = tracing::debug_span!("vorple.dispatch", text = %command.text).entered();
        let QueuedCommand { text, options } = command;

        self.interactive = false;
        let turn_before = self.turn.clone();
        if options.hide_command {
            self.turn.command_visible = false;
        }
        if options.hide_output {
            self.turn.output_visible = false;
        }
        self.turn.skip_filters = options.skip_filters;

        let previous_value = self.prompt.take_value();
        self.prompt.set_value(text.as_str());

        let line = if self.turn.skip_filters {
            text.clone()
        } else {
            let mut ctx =
                FilterContext::new(&self.turn, Some(text.as_str()), options.user_action, &mut self.outbox);
            match self.filters.run_input(&text, &mut ctx) {
                FilterOutcome::Passed(line) => line,
                FilterOutcome::Suppressed(by) => {
                    tracing::debug!(target: "vorple.queue", filter = %by, "command dropped by input filter");
                    self.turn = turn_before;
                    self.prompt.set_value(previous_value);
                    self.interactive = true;
                    self.flush_outbox();
                    return false;
                }
            }
        };
        self.flush_outbox();

        if options.hide_command {
            self.restore_prompt = Some(previous_value);
        }
        self.prompt.set_value(String::new());
        self.text_input();

        let meta = HookMeta {
            input: Some(HookInput::Text(line.clone())),
            original: Some(HookInput::Text(text)),
            user_action: options.user_action,
            silent: options.hide_command && options.hide_output,
            ..HookMeta::new(EventCategory::SubmitCommand)
        };
        let pending = self.listeners.trigger(EventCategory::SubmitCommand, &meta);
        self.deliver(Signal::Line(line), pending);
        true
    }

    fn flush_outbox(&mut self) {
        for command in std::mem::take(&mut self.outbox) {
            self.queue.push(command);
        }
    }

    /// Send to the engine now, or park until every deferred has settled.
    fn deliver(&mut self, signal: Signal, pending: Vec<Deferred>) -> bool {
        if pending.is_empty() {
            self.send_signal(signal);
            return true;
        }
        tracing::debug!(target: "vorple.session", ?signal, waiting = pending.len(), "engine call parked");
        self.parked.push_back(Parked {
            deferred: Deferred::all(pending),
            signal,
        });
        false
    }

    fn send_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Line(line) => self.host.engine().send_line(&line),
            Signal::Char(code) => self.host.engine().send_char(code),
        }
    }

    /// Deliver parked engine calls whose deferreds have settled.
    ///
    /// Returns how many were delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        let mut waiting = VecDeque::with_capacity(self.parked.len());
        while let Some(parked) = self.parked.pop_front() {
            if parked.deferred.is_settled() {
                self.send_signal(parked.signal);
                delivered += 1;
            } else {
                waiting.push_back(parked);
            }
        }
        self.parked = waiting;
        if delivered > 0 {
            tracing::trace!(target: "vorple.session", delivered, "pumped");
        }
        delivered
    }

    // ── turns ──────────────────────────────────────────────────────────

    /// The engine finished a turn and is waiting for input.
    ///
    /// Runs the output filters and the meta stage, resets the per-command
    /// flags, runs queued story code, and gets ready for the next input: a
    /// line turn fires `expectCommand` and drains the command queue, a char
    /// turn waits for a key.
    pub fn complete_turn(&mut self, structure: TurnStructure, mode: TurnMode) -> TurnOutcome {
        let _span = tracing::debug_span!(
            "vorple.turn",
            mode = ?mode,
            turn_type = self.turn.turn_type.name()
        )
        .entered();

        self.flush_all();

        if !self.first_turn_done {
            self.first_turn_done = true;
            if self.vorple_story {
                self.queue.push(QueuedCommand::new(
                    START_STORY_COMMAND,
                    CommandOptions::default().hide_command(true).skip_filters(true),
                ));
            }
        }

        let content = TurnContent::from_structure(structure, mode);
        let filtered = if self.turn.skip_filters {
            FilterOutcome::Passed(content)
        } else {
            let mut ctx = FilterContext::new(&self.turn, None, false, &mut self.outbox);
            self.filters.run_output(content, &mut ctx)
        };
        self.flush_outbox();

        let restored = self.restore_prompt.take();
        let outcome = match filtered {
            FilterOutcome::Suppressed(_) => TurnOutcome::Suppressed,
            FilterOutcome::Passed(content) => match meta_stage(content, &self.turn) {
                MetaDecision::Render(_) if self.turn.is_hidden() => TurnOutcome::Suppressed,
                MetaDecision::Render(mut content) => {
                    if let Some(value) = &restored {
                        content.prompt.value.clone_from(value);
                    }
                    TurnOutcome::Rendered(RenderedTurn {
                        prompt_value: content.prompt.value.clone(),
                        command_visible: self.turn.command_visible,
                        output_visible: self.turn.output_visible,
                        content,
                    })
                }
                MetaDecision::Notify(notification) => {
                    self.notifications.push(notification.clone());
                    TurnOutcome::Notified(notification)
                }
                MetaDecision::Discard => TurnOutcome::Suppressed,
            },
        };

        let prompt_value = match &outcome {
            TurnOutcome::Rendered(rendered) => rendered.prompt_value.clone(),
            _ => restored.unwrap_or_default(),
        };
        self.prompt.set_value(prompt_value);

        self.turn.reset_visibility();
        self.turn.mode = mode;
        for error in self.evals.run_all() {
            self.reporter.error(&error);
        }

        self.interactive = mode == TurnMode::Line;
        match mode {
            TurnMode::Line => {
                self.input.set_mode(InputMode::GetLine);
                self.listeners.trigger(
                    EventCategory::ExpectCommand,
                    &HookMeta::new(EventCategory::ExpectCommand),
                );
                self.run_command_queue();
            }
            TurnMode::Char => {
                self.wait_for_key();
            }
        }
        outcome
    }

    /// The player started typing a new command: the previous turn type no
    /// longer applies.
    pub fn text_input(&mut self) {
        self.turn.turn_type = TurnType::Normal;
    }

    pub fn hide_command(&mut self, hide: bool) {
        self.turn.command_visible = !hide;
    }

    pub fn hide_output(&mut self, hide: bool) {
        self.turn.output_visible = !hide;
    }

    /// Set the current turn's type by name. Unknown names are reported and
    /// leave the type unchanged.
    pub fn set_turn_type(&mut self, name: &str) {
        match name.parse::<TurnType>() {
            Ok(turn_type) => self.turn.turn_type = turn_type,
            Err(error) => self.reporter.error(&error),
        }
    }

    /// The story announced that it uses Vorple.
    pub fn set_vorple_story(&mut self) {
        self.vorple_story = true;
    }

    pub fn is_vorple_story(&self) -> bool {
        self.vorple_story
    }

    /// Queue story code to run after the current turn renders.
    pub fn queue_expression<F>(&mut self, snippet: impl Into<String>, job: F)
    where
        F: FnOnce() -> Result<(), String> + 'static,
    {
        self.evals.push(snippet, job);
    }

    // ── filters and listeners ──────────────────────────────────────────

    pub fn register_filter(&mut self, filter: FilterFn, options: FilterOptions) -> FilterHandle {
        self.filters.register(filter, options)
    }

    pub fn unregister_filter(&mut self, name: &str) -> bool {
        self.filters.unregister(name)
    }

    /// Register a listener for named events.
    ///
    /// Unknown names are reported and skipped; the listener is registered
    /// for the rest.
    pub fn add_event_listener<F, R>(&mut self, names: &[&str], listener: F) -> ListenerHandle
    where
        F: FnMut(&HookMeta) -> R + 'static,
        R: Into<HookResult>,
    {
        if names.is_empty() {
            self.reporter
                .error(&VorpleError::MissingEventName { action: "add" });
        }
        let categories = self.parse_categories(names, "add");
        self.listeners.add(&categories, listener)
    }

    /// Remove a listener from named events.
    ///
    /// Returns true if it was removed from at least one of them. An empty
    /// list trivially succeeds.
    pub fn remove_event_listener(&mut self, names: &[&str], id: ListenerId) -> bool {
        if names.is_empty() {
            return true;
        }
        let categories = self.parse_categories(names, "remove");
        !categories.is_empty() && self.listeners.remove(&categories, id)
    }

    /// Remove a listener from everything it was registered for.
    pub fn remove_listener(&mut self, handle: &ListenerHandle) -> bool {
        self.listeners.remove(&handle.categories, handle.id)
    }

    fn parse_categories(&mut self, names: &[&str], action: &'static str) -> Vec<EventCategory> {
        let mut categories = Vec::with_capacity(names.len());
        for name in names {
            match EventCategory::parse(name, action) {
                Ok(category) => categories.push(category),
                Err(error) => self.reporter.error(&error),
            }
        }
        categories
    }

    // ── keys ───────────────────────────────────────────────────────────

    /// Set the input mode by name. Unknown names are reported and the
    /// current mode stays.
    pub fn set_mode_named(&mut self, name: &str) {
        match name.parse::<InputMode>() {
            Ok(mode) => self.set_mode(mode),
            Err(error) => self.reporter.error(&error),
        }
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.input.set_mode(mode);
    }

    /// Route a page event.
    pub fn send_key(&mut self, event: Event) -> KeyDispatch {
        match self.input.classify(&event) {
            KeyDecision::Ignored => KeyDispatch::Ignored,
            KeyDecision::Buffered => KeyDispatch::Buffered,
            KeyDecision::Scroll => KeyDispatch::Scroll,
            KeyDecision::ScrolledToBottom => KeyDispatch::ScrolledToBottom,
            KeyDecision::Exit => KeyDispatch::Exit(self.options.exit_url().map(str::to_owned)),
            KeyDecision::Submit {
                code,
                mouse_click,
                user_action,
            } => {
                let input = (!mouse_click).then_some(HookInput::Key(code));
                let meta = HookMeta {
                    input: input.clone(),
                    original: input,
                    user_action,
                    mouse_click,
                    ..HookMeta::new(EventCategory::SubmitKeypress)
                };
                let pending = self.listeners.trigger(EventCategory::SubmitKeypress, &meta);
                if self.deliver(Signal::Char(code), pending) {
                    KeyDispatch::Delivered(code)
                } else {
                    KeyDispatch::Deferred(code)
                }
            }
        }
    }

    /// The engine wants a single key.
    ///
    /// Fires `expectKeypress`, then replays a queued or buffered key if
    /// there is one.
    pub fn wait_for_key(&mut self) -> Option<KeyDispatch> {
        self.input.set_mode(InputMode::GetKey);
        self.flush_all();
        self.listeners.trigger(
            EventCategory::ExpectKeypress,
            &HookMeta::new(EventCategory::ExpectKeypress),
        );

        let code = self
            .key_queue
            .pop_front()
            .or_else(|| self.input.take_key())?;
        Some(self.send_key(Event::Key(KeyEvent::forced(code))))
    }

    /// Whether a buffered key is waiting. Flushes output first.
    pub fn is_key_waiting(&mut self) -> bool {
        self.flush_all();
        self.input.is_key_waiting()
    }

    pub fn take_buffered_key(&mut self) -> Option<KeyCode> {
        self.input.take_key()
    }

    /// Queue a key to answer the next key request. A key queued while the
    /// engine already waits for one is sent at once.
    pub fn queue_keypress(&mut self, key: impl Into<KeyCode>) -> Option<KeyDispatch> {
        self.key_queue.push_back(key.into());
        if self.input.mode() != InputMode::GetKey {
            return None;
        }
        let code = self.key_queue.pop_front()?;
        Some(self.send_key(Event::Key(KeyEvent::forced(code))))
    }

    pub fn clear_key_queue(&mut self) {
        self.key_queue.clear();
    }

    /// The story ended.
    pub fn quit(&mut self) {
        self.flush_all();
        self.input.set_mode(InputMode::EndGame);
        self.interactive = false;
        self.listeners
            .trigger(EventCategory::Quit, &HookMeta::new(EventCategory::Quit));
    }

    // ── output ─────────────────────────────────────────────────────────

    pub fn print(&mut self, text: &str, window: usize) {
        let current = text_style(&mut self.style, window);
        self.buffer.append(text, window, self.host.surface(), current);
    }

    pub fn newline(&mut self, window: usize) {
        let current = text_style(&mut self.style, window);
        self.buffer.newline(window, self.host.surface(), current);
    }

    pub fn flush(&mut self, window: usize) -> bool {
        let current = text_style(&mut self.style, window);
        self.buffer.flush(window, self.host.surface(), current)
    }

    pub fn flush_all(&mut self) {
        let Self {
            buffer,
            host,
            style,
            ..
        } = self;
        buffer.flush_all(host.surface(), |window| text_style(style, window));
    }

    pub fn set_text_filter<F>(&mut self, filter: F)
    where
        F: FnMut(&str, TextStyle) -> Option<String> + 'static,
    {
        self.buffer.set_text_filter(filter);
    }

    pub fn clear_text_filter(&mut self) {
        self.buffer.clear_text_filter();
    }

    /// Whether main-window text was printed since the last check.
    pub fn take_text_printed(&mut self) -> bool {
        self.buffer.take_text_printed()
    }

    /// Text the engine wrote outside its windows.
    pub fn engine_stdout(&mut self, output: &str) {
        self.reporter.error(&VorpleError::EngineOutput {
            output: output.to_owned(),
        });
    }

    /// Report an error without stopping.
    pub fn report(&mut self, error: &VorpleError) {
        self.reporter.error(error);
    }

    // ── style ──────────────────────────────────────────────────────────

    pub fn set_attr(&mut self, attr: FontAttr, on: bool, window: usize) {
        let current = text_style(&mut self.style, window);
        let Self {
            style,
            buffer,
            host,
            ..
        } = self;
        style.set_attr(attr, on, window, |w| {
            buffer.flush(w, host.surface(), current);
        });
    }

    pub fn set_color(&mut self, slot: ColorSlot, value: u32, window: usize) -> bool {
        let current = text_style(&mut self.style, window);
        let Self {
            style,
            buffer,
            host,
            ..
        } = self;
        style.set_color(slot, value, window, |w| {
            buffer.flush(w, host.surface(), current);
        })
    }

    /// Save the colours and fonts of every window.
    #[must_use]
    pub fn style_snapshot(&self) -> StyleSnapshot {
        self.style.snapshot()
    }

    /// Put saved colours back. Pending output keeps the old colours.
    pub fn restore_colors(&mut self, snapshot: &StyleSnapshot) {
        self.flush_all();
        self.style.restore_colors(snapshot);
    }

    /// Put saved fonts back. Pending output keeps the old fonts.
    pub fn restore_fonts(&mut self, snapshot: &StyleSnapshot) {
        self.flush_all();
        self.style.restore_fonts(snapshot);
    }

    pub fn set_original_font(&mut self, window: usize, original: i32) {
        self.style.set_original_font(window, original);
    }

    /// Apply a Glk style to the main window.
    pub fn set_style_hint_style(&mut self, style_code: u32) {
        let current = text_style(&mut self.style, 0);
        let Self {
            style,
            buffer,
            host,
            ..
        } = self;
        style.set_style_hint_style(style_code, |w| {
            buffer.flush(w, host.surface(), current);
        });
    }

    pub fn set_style_hint(&mut self, style_code: u32, hint: u32, value: i32) {
        self.style.set_style_hint(style_code, hint, value);
    }

    /// Put a window's current style on an element. Window 0 styles are
    /// mirrored onto the prompt.
    pub fn apply_style(&mut self, element: &mut ClassList, window: usize) {
        self.style
            .apply(element, Some(&mut self.prompt.classes), window);
    }

    // ── tag streams ────────────────────────────────────────────────────

    /// Open an element and send further output of the window into it.
    ///
    /// Returns the new element's id, or `None` for an invalid tag name.
    pub fn open_tag(&mut self, tag: &str, classes: &str, window: usize) -> Option<String> {
        self.flush(window);
        let opened = self.tags.open_tag(tag, classes, window, &mut self.ids)?;
        self.host.surface().append(window, &opened.html);
        Some(opened.id)
    }

    /// Returns false when output was already at window level.
    pub fn close_tag(&mut self, window: usize) -> bool {
        self.flush(window);
        match self.tags.close_tag(window) {
            Some(end) => {
                self.host.surface().append(window, &end);
                true
            }
            None => false,
        }
    }

    pub fn close_all_tags(&mut self, window: usize) {
        self.flush(window);
        let end = self.tags.close_all_tags(window);
        if !end.is_empty() {
            self.host.surface().append(window, &end);
        }
    }

    /// Id of the element output currently goes into.
    pub fn stream(&self, window: usize) -> Option<&str> {
        self.tags.stream(window)
    }

    /// A fresh element id.
    pub fn generate_id(&mut self) -> String {
        self.ids.generate()
    }

    // ── debugging ──────────────────────────────────────────────────────

    /// Print a bracketed debug line when debugging is on.
    pub fn debug_log(&mut self, text: &str) -> bool {
        match self.reporter.log(text) {
            Some(line) => {
                self.print(&line, 0);
                true
            }
            None => false,
        }
    }

    pub fn debug_on(&mut self) -> bool {
        self.reporter.on()
    }

    pub fn debug_off(&mut self) -> bool {
        self.reporter.off()
    }

    pub fn debug_toggle(&mut self, to: Option<bool>) -> bool {
        self.reporter.toggle(to)
    }

    pub fn debug_status(&self) -> bool {
        self.reporter.status()
    }
}
