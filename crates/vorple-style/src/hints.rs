#![forbid(unsafe_code)]

//! Glk style hints.
//!
//! Glulx stories select one of a fixed set of named styles, and can tweak
//! what each style means through style hints. The table maps a style number
//! to the font attributes it switches. Unknown styles are ignored.

use ahash::AHashMap;

use crate::tracker::FontAttr;

/// The eleven Glk styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GlkStyle {
    Normal = 0,
    Emphasized = 1,
    Preformatted = 2,
    Header = 3,
    Subheader = 4,
    Alert = 5,
    Note = 6,
    BlockQuote = 7,
    Input = 8,
    User1 = 9,
    User2 = 10,
}

impl GlkStyle {
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Normal,
            1 => Self::Emphasized,
            2 => Self::Preformatted,
            3 => Self::Header,
            4 => Self::Subheader,
            5 => Self::Alert,
            6 => Self::Note,
            7 => Self::BlockQuote,
            8 => Self::Input,
            9 => Self::User1,
            10 => Self::User2,
            _ => return None,
        })
    }
}

/// Style hint codes this runtime understands.
pub const HINT_WEIGHT: u32 = 4;
pub const HINT_OBLIQUE: u32 = 5;
pub const HINT_PROPORTIONAL: u32 = 6;

/// Attribute changes a style applies. `None` leaves the attribute alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HintBundle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
}

impl HintBundle {
    /// A bundle that resets every attribute.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            bold: Some(false),
            italic: Some(false),
            underline: Some(false),
        }
    }

    /// The changes in application order.
    pub fn changes(&self) -> impl Iterator<Item = (FontAttr, bool)> + '_ {
        [
            (FontAttr::Bold, self.bold),
            (FontAttr::Italic, self.italic),
            (FontAttr::Underline, self.underline),
        ]
        .into_iter()
        .filter_map(|(attr, value)| value.map(|v| (attr, v)))
    }
}

/// Style number to attribute bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleHints {
    table: AHashMap<u32, HintBundle>,
}

impl Default for StyleHints {
    fn default() -> Self {
        let table = [
            (GlkStyle::Normal, HintBundle::plain()),
            (
                GlkStyle::Emphasized,
                HintBundle {
                    italic: Some(true),
                    ..HintBundle::default()
                },
            ),
            (GlkStyle::Preformatted, HintBundle::default()),
            (
                GlkStyle::Header,
                HintBundle {
                    bold: Some(true),
                    ..HintBundle::default()
                },
            ),
            (
                GlkStyle::Subheader,
                HintBundle {
                    bold: Some(true),
                    ..HintBundle::default()
                },
            ),
        ]
        .into_iter()
        .map(|(style, bundle)| (style as u32, bundle))
        .collect();
        Self { table }
    }
}

impl StyleHints {
    /// The bundle for a style, if the style is known.
    #[must_use]
    pub fn bundle(&self, style: u32) -> Option<&HintBundle> {
        self.table.get(&style)
    }

    /// Change one hint of a style, creating a plain entry for unknown styles.
    ///
    /// Weight and oblique are honoured (`value == 1` switches them on).
    /// Proportional spacing and every other hint are accepted and ignored.
    /// Style numbers come straight from the story and may be sparse.
    pub fn set_hint(&mut self, style: u32, hint: u32, value: i32) {
        let bundle = self.table.entry(style).or_insert_with(HintBundle::plain);

        match hint {
            HINT_WEIGHT => bundle.bold = Some(value == 1),
            HINT_OBLIQUE => bundle.italic = Some(value == 1),
            HINT_PROPORTIONAL => {}
            other => {
                tracing::trace!(target: "vorple.style", style, hint = other, "ignoring style hint");
            }
        }
    }
}
