#![forbid(unsafe_code)]

//! JSON decoding of page events pushed by the JS shim.
//!
//! [`parse_encoded_event`] turns one JSON object into a [`HostEvent`]. Kinds
//! the runtime has no use for (focus changes, resize, anything unknown)
//! decode to `Ok(None)` so the shim can forward events without filtering.
//!
//! # Schema
//!
//! ```text
//! {"kind":"keydown","code":89,"mods":0}
//! {"kind":"click","mods":0,"control":false}
//! {"kind":"scroll","atBottom":false}
//! {"kind":"init.vorple"}
//! {"kind":"TextInput"}
//! {"kind":"TurnComplete","mode":"line"}
//! {"kind":"commandLink","href":"look","classes":"commandLink hideCommand"}
//! {"kind":"submit","value":"take lamp"}
//! {"kind":"print","text":"You see a lamp.\n","window":0}
//! ```
//!
//! `mods` is a bitmask: 1 shift, 2 alt, 4 ctrl, 8 meta.
//!
//! # Design
//! Feature-gated behind `input-parser` so a host that builds [`HostEvent`]
//! values directly doesn't pull in `serde_json`.

use serde::Deserialize;
use vorple_core::{ClickEvent, Event, KeyCode, KeyEvent, Modifiers};
use vorple_runtime::TurnMode;
use vorple_style::ClassList;

use crate::HostEvent;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventParseError {
    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown turn mode: {0}")]
    UnknownMode(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    kind: String,
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    mods: Option<i32>,
    #[serde(default)]
    control: Option<bool>,
    #[serde(default)]
    at_bottom: Option<bool>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    classes: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    window: Option<usize>,
}

/// Decode one page event.
///
/// Returns `Err` for malformed JSON, a missing field the kind needs, or a
/// `TurnComplete` with a mode other than `line` or `char`.
pub fn parse_encoded_event(json: &str) -> Result<Option<HostEvent>, EventParseError> {
    let raw: RawEvent =
        serde_json::from_str(json).map_err(|e| EventParseError::Json(e.to_string()))?;

    let event = match raw.kind.as_str() {
        "keydown" => {
            let code = raw.code.ok_or(EventParseError::MissingField("code"))?;
            HostEvent::Page(Event::Key(
                KeyEvent::new(KeyCode(code)).with_modifiers(parse_modifiers(raw.mods)),
            ))
        }
        "click" => HostEvent::Page(Event::Click(ClickEvent {
            modifiers: parse_modifiers(raw.mods),
            on_control: raw.control.unwrap_or(false),
        })),
        "scroll" => HostEvent::Page(Event::Viewport {
            at_bottom: raw.at_bottom.ok_or(EventParseError::MissingField("atBottom"))?,
        }),
        "init.vorple" => HostEvent::Init,
        "TextInput" => HostEvent::TextInput,
        "TurnComplete" => {
            let mode = raw.mode.ok_or(EventParseError::MissingField("mode"))?;
            HostEvent::TurnComplete {
                mode: parse_mode(&mode)?,
            }
        }
        "commandLink" => {
            let command = raw.href.ok_or(EventParseError::MissingField("href"))?;
            let classes = raw.classes.as_deref().map(ClassList::parse).unwrap_or_default();
            HostEvent::CommandLink {
                command,
                hide_command: classes.contains("hideCommand"),
                hide_output: classes.contains("hideResponse"),
            }
        }
        "submit" => HostEvent::Submit {
            text: raw.value.ok_or(EventParseError::MissingField("value"))?,
        },
        "print" => HostEvent::Print {
            text: raw.text.ok_or(EventParseError::MissingField("text"))?,
            window: raw.window.unwrap_or(0),
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}

fn parse_modifiers(mods: Option<i32>) -> Modifiers {
    let bits = mods.unwrap_or(0).clamp(0, i32::from(u8::MAX)) as u8;
    Modifiers::from_bits_truncate(bits)
}

fn parse_mode(mode: &str) -> Result<TurnMode, EventParseError> {
    match mode {
        "line" => Ok(TurnMode::Line),
        "char" => Ok(TurnMode::Char),
        other => Err(EventParseError::UnknownMode(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> HostEvent {
        parse_encoded_event(json).unwrap().unwrap()
    }

    #[test]
    fn keydown_with_modifiers() {
        assert_eq!(
            parse(r#"{"kind":"keydown","code":67,"mods":4}"#),
            HostEvent::Page(Event::Key(
                KeyEvent::new(KeyCode(67)).with_modifiers(Modifiers::CTRL)
            ))
        );
        assert_eq!(
            parse(r#"{"kind":"keydown","code":13}"#),
            HostEvent::Page(Event::Key(KeyEvent::new(KeyCode::ENTER)))
        );
    }

    #[test]
    fn clicks_and_scrolling() {
        assert_eq!(
            parse(r#"{"kind":"click","control":true}"#),
            HostEvent::Page(Event::Click(ClickEvent {
                modifiers: Modifiers::empty(),
                on_control: true,
            }))
        );
        assert_eq!(
            parse(r#"{"kind":"scroll","atBottom":false}"#),
            HostEvent::Page(Event::Viewport { at_bottom: false })
        );
    }

    #[test]
    fn lifecycle_events() {
        assert_eq!(parse(r#"{"kind":"init.vorple"}"#), HostEvent::Init);
        assert_eq!(parse(r#"{"kind":"TextInput"}"#), HostEvent::TextInput);
        assert_eq!(
            parse(r#"{"kind":"TurnComplete","mode":"char"}"#),
            HostEvent::TurnComplete {
                mode: TurnMode::Char
            }
        );
    }

    #[test]
    fn command_link_classes() {
        assert_eq!(
            parse(r#"{"kind":"commandLink","href":"look","classes":"commandLink hideResponse"}"#),
            HostEvent::CommandLink {
                command: "look".into(),
                hide_command: false,
                hide_output: true,
            }
        );
    }

    #[test]
    fn submit_and_print() {
        assert_eq!(
            parse(r#"{"kind":"submit","value":"take lamp"}"#),
            HostEvent::Submit {
                text: "take lamp".into()
            }
        );
        assert_eq!(
            parse(r#"{"kind":"print","text":"Hi\n"}"#),
            HostEvent::Print {
                text: "Hi\n".into(),
                window: 0
            }
        );
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        assert_eq!(parse_encoded_event(r#"{"kind":"focus"}"#), Ok(None));
    }

    #[test]
    fn errors() {
        assert!(matches!(
            parse_encoded_event("{not json"),
            Err(EventParseError::Json(_))
        ));
        assert_eq!(
            parse_encoded_event(r#"{"kind":"keydown"}"#),
            Err(EventParseError::MissingField("code"))
        );
        assert_eq!(
            parse_encoded_event(r#"{"kind":"TurnComplete","mode":"word"}"#),
            Err(EventParseError::UnknownMode("word".into()))
        );
        assert_eq!(
            EventParseError::MissingField("href").to_string(),
            "missing required field: href"
        );
    }
}
