#![forbid(unsafe_code)]

//! Interpreter options.
//!
//! Options start from compiled-in defaults, can be overridden by the embedder
//! (directly, or from a TOML/JSON file), and are finally resolved against the
//! page URL's query string with typed coercion:
//!
//! ```text
//! play.html?story=game.gblorb&autosave=off&exit_url=https://example.com
//! ```
//!
//! Booleans accept `true`/`on`/`1` and `false`/`off`/`0` (anything else keeps
//! the default). Numbers must round-trip exactly or they become `NaN`.
//! Strings fall back to the default when empty.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_PROXY_URL: &str =
    "https://zcode.appspot.com/proxy/?encode=base64&callback=processBase64Zcode&url=%s";

/// Errors from loading or mutating options.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown option: {0}")]
    Unknown(String),

    #[error("option {name} expects a {expected} value")]
    WrongType { name: String, expected: ParamType },
}

/// How a query parameter is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Boolean,
    Number,
    String,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
        })
    }
}

/// A dynamically typed option value, as read through [`Options::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    Str(String),
}

impl OptionValue {
    #[must_use]
    pub const fn param_type(&self) -> ParamType {
        match self {
            Self::Bool(_) => ParamType::Boolean,
            Self::Number(_) => ParamType::Number,
            Self::Str(_) => ParamType::String,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// The option set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Save the game automatically after every turn.
    pub autosave: bool,

    /// Where to navigate when the game has ended. Empty means nowhere.
    pub exit_url: String,

    /// Enable the interpreter's extra opcodes.
    pub extra_opcodes: bool,

    /// Proxy used for fetching story files from other origins. `%s` is
    /// replaced by the story URL.
    pub proxy_url: String,

    /// `auto`, `always`, or `never`.
    pub use_proxy: String,

    /// Allow more windows than the main one (status line etc).
    pub windowing: bool,

    /// Story file to load.
    pub story: Option<String>,

    /// Ignore the `story`/`storyfile` URL parameters.
    pub lock_story: bool,

    /// Ignore all other URL parameters.
    pub lock_options: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            autosave: true,
            exit_url: String::new(),
            extra_opcodes: true,
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            use_proxy: "auto".to_string(),
            windowing: true,
            story: None,
            lock_story: false,
            lock_options: false,
        }
    }
}

/// Names of the options that can be read from the URL, with their types.
const URL_OPTIONS: &[(&str, ParamType)] = &[
    ("autosave", ParamType::Boolean),
    ("exit_url", ParamType::String),
    ("extra_opcodes", ParamType::Boolean),
    ("proxy_url", ParamType::String),
    ("use_proxy", ParamType::String),
    ("windowing", ParamType::Boolean),
];

impl Options {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Defaults overridden by the page URL.
    #[must_use]
    pub fn from_query(url: &str) -> Self {
        Self::default().resolve_url(url)
    }

    /// Resolve URL parameters on top of these options.
    ///
    /// `url` may be a full URL or just its query part.
    #[must_use]
    pub fn resolve_url(mut self, url: &str) -> Self {
        if !self.lock_story {
            let story = get_parameter(url, "story", ParamType::String, OptionValue::Str(String::new()));
            let storyfile =
                get_parameter(url, "storyfile", ParamType::String, OptionValue::Str(String::new()));
            match (story, storyfile) {
                (OptionValue::Str(s), _) if !s.is_empty() => self.story = Some(s),
                (_, OptionValue::Str(s)) if !s.is_empty() => self.story = Some(s),
                _ => {}
            }
        }

        if !self.lock_options {
            for &(name, ty) in URL_OPTIONS {
                let Some(current) = self.get(name) else {
                    continue;
                };
                let value = get_parameter(url, name, ty, current);
                if let Err(err) = self.set(name, value) {
                    tracing::warn!(target: "vorple.options", option = name, error = %err, "ignoring URL option");
                }
            }

            if self.exit_url == "false" || self.exit_url == "0" {
                self.exit_url.clear();
            }
        }

        tracing::debug!(target: "vorple.options", story = ?self.story, "options resolved");
        self
    }

    /// Read an option by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        Some(match name {
            "autosave" => OptionValue::Bool(self.autosave),
            "exit_url" => OptionValue::Str(self.exit_url.clone()),
            "extra_opcodes" => OptionValue::Bool(self.extra_opcodes),
            "proxy_url" => OptionValue::Str(self.proxy_url.clone()),
            "use_proxy" => OptionValue::Str(self.use_proxy.clone()),
            "windowing" => OptionValue::Bool(self.windowing),
            "story" => OptionValue::Str(self.story.clone().unwrap_or_default()),
            "lock_story" => OptionValue::Bool(self.lock_story),
            "lock_options" => OptionValue::Bool(self.lock_options),
            _ => return None,
        })
    }

    /// Set an option by name. The value must have the option's type.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionsError> {
        fn wrong(name: &str, expected: ParamType) -> OptionsError {
            OptionsError::WrongType {
                name: name.to_string(),
                expected,
            }
        }

        match (name, value) {
            ("autosave", OptionValue::Bool(b)) => self.autosave = b,
            ("extra_opcodes", OptionValue::Bool(b)) => self.extra_opcodes = b,
            ("windowing", OptionValue::Bool(b)) => self.windowing = b,
            ("lock_story", OptionValue::Bool(b)) => self.lock_story = b,
            ("lock_options", OptionValue::Bool(b)) => self.lock_options = b,
            ("exit_url", OptionValue::Str(s)) => self.exit_url = s,
            ("proxy_url", OptionValue::Str(s)) => self.proxy_url = s,
            ("use_proxy", OptionValue::Str(s)) => self.use_proxy = s,
            ("story", OptionValue::Str(s)) => self.story = (!s.is_empty()).then_some(s),
            ("autosave" | "extra_opcodes" | "windowing" | "lock_story" | "lock_options", _) => {
                return Err(wrong(name, ParamType::Boolean));
            }
            ("exit_url" | "proxy_url" | "use_proxy" | "story", _) => {
                return Err(wrong(name, ParamType::String));
            }
            _ => return Err(OptionsError::Unknown(name.to_string())),
        }
        Ok(())
    }

    /// The exit URL, if one is configured.
    #[must_use]
    pub fn exit_url(&self) -> Option<&str> {
        (!self.exit_url.is_empty()).then_some(self.exit_url.as_str())
    }

    /// Validate option values.
    ///
    /// Returns a list of problems. An empty list means the options are valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !matches!(self.use_proxy.as_str(), "auto" | "always" | "never") {
            errors.push(format!(
                "use_proxy must be one of auto, always, never; got {}",
                self.use_proxy
            ));
        }

        if self.use_proxy != "never" && !self.proxy_url.contains("%s") {
            errors.push("proxy_url must contain a %s placeholder".into());
        }

        errors
    }
}

/// Read and coerce one query parameter from `url`.
///
/// Names match case-insensitively. `+` decodes to a space before percent
/// decoding. Returns `default` when the parameter is absent or can't be
/// coerced (numbers return `NaN` instead).
#[must_use]
pub fn get_parameter(url: &str, name: &str, ty: ParamType, default: OptionValue) -> OptionValue {
    let Some(raw) = find_raw_parameter(url, name) else {
        return default;
    };
    let value = decode_component(&raw.replace('+', " "));

    match ty {
        ParamType::Boolean => {
            let lower = value.to_ascii_lowercase();
            if lower == "true" || value == "on" || value == "1" {
                OptionValue::Bool(true)
            } else if lower == "false" || value == "off" || value == "0" {
                OptionValue::Bool(false)
            } else {
                default
            }
        }
        ParamType::Number => match value.parse::<f64>() {
            Ok(n) if n.to_string() == value => OptionValue::Number(n),
            _ => OptionValue::Number(f64::NAN),
        },
        ParamType::String => {
            if value.is_empty() {
                default
            } else {
                OptionValue::Str(value)
            }
        }
    }
}

fn find_raw_parameter<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let query = match url.find('?') {
        Some(start) => &url[start + 1..],
        None => url,
    };
    let query = query.split('#').next().unwrap_or_default();

    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        key.eq_ignore_ascii_case(name).then_some(value)
    })
}

/// Percent-decode a URI component. Malformed escapes are kept verbatim.
fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    match String::from_utf8(out) {
        Ok(decoded) => decoded,
        Err(_) => input.to_string(),
    }
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
