#![forbid(unsafe_code)]

//! Input mode state machine.
//!
//! # Role in Vorple
//! Decides what a keypress or click on the page means given what the engine
//! is waiting for. The machine only classifies events and keeps the key
//! buffer; the session runs hooks and talks to the engine.
//!
//! # States
//!
//! ```text
//!   None ──start──▶ Buffer ◀──key delivered── GetKey
//!                     │  ▲                       ▲
//!                     │  └──────────────────────┘│
//!                     └──── wait_for_key ─────────┘
//!   GetLine: the page's text input handles typing; events only scroll.
//!   EndGame: terminal; events navigate to the exit URL.
//! ```
//!
//! # Failure Modes
//! - **Modifier held**: the event is ignored in every mode, shift included.
//! - **Scrolled away**: in `GetKey` an unforced event only scrolls back to
//!   the prompt. The engine keeps waiting.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use vorple_core::{Event, KeyCode, VorpleError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InputMode {
    /// Startup; nothing is accepted.
    #[default]
    None,
    Buffer,
    GetLine,
    GetKey,
    EndGame,
}

impl InputMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Buffer => "buffer",
            Self::GetLine => "getline",
            Self::GetKey => "getkey",
            Self::EndGame => "endgame",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InputMode {
    type Err = VorpleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "buffer" => Ok(Self::Buffer),
            "getline" => Ok(Self::GetLine),
            "getkey" => Ok(Self::GetKey),
            "endgame" => Ok(Self::EndGame),
            other => Err(VorpleError::UnknownInputMode {
                mode: other.to_owned(),
            }),
        }
    }
}

/// What the machine made of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDecision {
    Ignored,
    /// Stored in the key buffer for a later `wait_for_key`.
    Buffered,
    /// Passthrough; the host should only scroll or focus the prompt.
    Scroll,
    /// The page was scrolled away; this event only brought it back.
    ScrolledToBottom,
    Exit,
    /// Hand the key to the engine, after `submitKeypress`.
    Submit {
        code: KeyCode,
        mouse_click: bool,
        user_action: bool,
    },
}

/// What happened to an event, as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDispatch {
    Ignored,
    Buffered,
    Scroll,
    ScrolledToBottom,
    /// Navigate to the exit URL, if one is configured.
    Exit(Option<String>),
    /// The engine received the key.
    Delivered(KeyCode),
    /// The key waits on a listener's deferred result.
    Deferred(KeyCode),
}

#[derive(Debug, Clone)]
pub struct InputState {
    mode: InputMode,
    key_buffer: VecDeque<KeyCode>,
    at_bottom: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            mode: InputMode::None,
            key_buffer: VecDeque::new(),
            at_bottom: true,
        }
    }
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        if mode != self.mode {
            tracing::trace!(target: "vorple.input", from = %self.mode, to = %mode, "input mode");
        }
        self.mode = mode;
    }

    /// First engine-ready signal: start buffering keys.
    pub fn start(&mut self) {
        if self.mode == InputMode::None {
            self.mode = InputMode::Buffer;
        }
    }

    #[must_use]
    pub const fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    #[must_use]
    pub fn is_key_waiting(&self) -> bool {
        !self.key_buffer.is_empty()
    }

    /// Oldest buffered key.
    pub fn take_key(&mut self) -> Option<KeyCode> {
        self.key_buffer.pop_front()
    }

    /// Classify an event and apply its effect on the machine.
    pub fn classify(&mut self, event: &Event) -> KeyDecision {
        let (code, mouse_click) = match event {
            Event::Viewport { at_bottom } => {
                self.at_bottom = *at_bottom;
                return KeyDecision::Ignored;
            }
            _ if !event.modifiers().is_empty() => return KeyDecision::Ignored,
            Event::Click(click) if click.on_control => return KeyDecision::Ignored,
            Event::Click(_) => (KeyCode::ENTER, true),
            Event::Key(key) => (key.code, false),
        };
        let forced = event.is_forced();

        match self.mode {
            InputMode::Buffer => {
                self.key_buffer.push_back(code);
                KeyDecision::Buffered
            }
            InputMode::None | InputMode::GetLine => KeyDecision::Scroll,
            InputMode::EndGame => KeyDecision::Exit,
            InputMode::GetKey => {
                if !self.at_bottom && !forced {
                    self.at_bottom = true;
                    return KeyDecision::ScrolledToBottom;
                }
                self.mode = InputMode::Buffer;
                KeyDecision::Submit {
                    code,
                    mouse_click,
                    user_action: !forced,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vorple_core::{ClickEvent, KeyEvent, Modifiers};

    fn key(ch: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::from_char(ch)))
    }

    fn in_mode(mode: InputMode) -> InputState {
        let mut state = InputState::new();
        state.set_mode(mode);
        state
    }

    #[test]
    fn start_only_leaves_none() {
        let mut state = InputState::new();
        state.start();
        assert_eq!(state.mode(), InputMode::Buffer);

        let mut state = in_mode(InputMode::GetLine);
        state.start();
        assert_eq!(state.mode(), InputMode::GetLine);
    }

    #[test]
    fn buffer_mode_queues_keys_in_order() {
        let mut state = in_mode(InputMode::Buffer);
        assert_eq!(state.classify(&key('a')), KeyDecision::Buffered);
        assert_eq!(state.classify(&key('b')), KeyDecision::Buffered);
        assert!(state.is_key_waiting());
        assert_eq!(state.take_key(), Some(KeyCode::from_char('a')));
        assert_eq!(state.take_key(), Some(KeyCode::from_char('b')));
        assert_eq!(state.take_key(), None);
    }

    #[test]
    fn ctrl_is_ignored_in_getkey() {
        let mut state = in_mode(InputMode::GetKey);
        let event = Event::Key(KeyEvent::new(KeyCode::from_char('c')).with_modifiers(Modifiers::CTRL));
        assert_eq!(state.classify(&event), KeyDecision::Ignored);
        assert_eq!(state.mode(), InputMode::GetKey);
    }

    #[test]
    fn bare_shift_is_ignored_too() {
        let mut state = in_mode(InputMode::Buffer);
        let event = Event::Key(KeyEvent::new(KeyCode(16)).with_modifiers(Modifiers::SHIFT));
        assert_eq!(state.classify(&event), KeyDecision::Ignored);
        assert!(!state.is_key_waiting());
    }

    #[test]
    fn getkey_submits_and_returns_to_buffer() {
        let mut state = in_mode(InputMode::GetKey);
        assert_eq!(
            state.classify(&key('y')),
            KeyDecision::Submit {
                code: KeyCode::from_char('y'),
                mouse_click: false,
                user_action: true,
            }
        );
        assert_eq!(state.mode(), InputMode::Buffer);
    }

    #[test]
    fn clicks_act_as_enter_unless_on_a_control() {
        let mut state = in_mode(InputMode::GetKey);
        let on_link = Event::Click(ClickEvent {
            on_control: true,
            ..ClickEvent::new()
        });
        assert_eq!(state.classify(&on_link), KeyDecision::Ignored);
        assert_eq!(
            state.classify(&Event::Click(ClickEvent::new())),
            KeyDecision::Submit {
                code: KeyCode::ENTER,
                mouse_click: true,
                user_action: true,
            }
        );
    }

    #[test]
    fn scrolled_away_only_scrolls_unless_forced() {
        let mut state = in_mode(InputMode::GetKey);
        state.classify(&Event::Viewport { at_bottom: false });

        assert_eq!(state.classify(&key('x')), KeyDecision::ScrolledToBottom);
        assert_eq!(state.mode(), InputMode::GetKey);

        state.classify(&Event::Viewport { at_bottom: false });
        let forced = Event::Key(KeyEvent::forced(KeyCode::SPACE));
        assert!(matches!(
            state.classify(&forced),
            KeyDecision::Submit {
                user_action: false,
                ..
            }
        ));
    }

    #[test]
    fn passthrough_and_terminal_modes() {
        assert_eq!(in_mode(InputMode::GetLine).classify(&key('a')), KeyDecision::Scroll);
        assert_eq!(in_mode(InputMode::None).classify(&key('a')), KeyDecision::Scroll);
        assert_eq!(in_mode(InputMode::EndGame).classify(&key('a')), KeyDecision::Exit);
    }

    #[test]
    fn mode_names() {
        assert_eq!("getkey".parse::<InputMode>(), Ok(InputMode::GetKey));
        let err = "sideways".parse::<InputMode>().unwrap_err();
        assert_eq!(err.to_string(), "Interpreter error: unknown input mode sideways");
        assert_eq!(InputMode::EndGame.to_string(), "endgame");
    }
}
