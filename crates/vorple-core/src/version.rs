#![forbid(unsafe_code)]

//! Version checks for story files that depend on a minimum runtime version.
//!
//! Comparison is component-wise on dot-separated numbers and only as deep as
//! the requirement: `"3"` accepts every 3.x.y, `"3.2"` accepts 3.2.y and up.

use crate::error::{Result, VorpleError};

/// The runtime version reported to stories.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_components(version: &str) -> Result<Vec<u64>> {
    version
        .trim()
        .split('.')
        .map(|part| {
            part.parse::<u64>().map_err(|_| VorpleError::InvalidVersion {
                version: version.to_string(),
            })
        })
        .collect()
}

/// Compare `current` against `required`.
///
/// Returns `Ok(true)` when `current` is at least `required`, looking only at
/// as many components as `required` names (and at most three).
pub fn version_satisfies(current: &str, required: &str) -> Result<bool> {
    let this = parse_components(current)?;
    let req = parse_components(required)?;

    for level in 0..3 {
        let (Some(&have), Some(&want)) = (this.get(level), req.get(level)) else {
            return Ok(true);
        };
        if have < want {
            return Ok(false);
        }
        if have > want {
            return Ok(true);
        }
    }

    Ok(true)
}

/// Check the running version against `required`.
///
/// With a callback, the callback receives the result and the call never
/// fails on a mismatch. Without one, a mismatch is an
/// [`VorpleError::VersionMismatch`].
pub fn require_version(required: &str, callback: Option<&mut dyn FnMut(bool)>) -> Result<bool> {
    require_version_at(VERSION, required, callback)
}

/// [`require_version`] against an explicit current version.
pub fn require_version_at(
    current: &str,
    required: &str,
    callback: Option<&mut dyn FnMut(bool)>,
) -> Result<bool> {
    let matches = version_satisfies(current, required)?;

    match callback {
        Some(cb) => {
            cb(matches);
            Ok(matches)
        }
        None if matches => Ok(true),
        None => Err(VorpleError::VersionMismatch {
            required: required.to_string(),
            current: current.to_string(),
        }),
    }
}

/// Accepted story releases: one minimum, or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseRange {
    AtLeast(u32),
    Between(u32, u32),
}

impl ReleaseRange {
    #[must_use]
    pub const fn contains(&self, release: u32) -> bool {
        match *self {
            Self::AtLeast(min) => release >= min,
            Self::Between(min, max) => release >= min && release <= max,
        }
    }
}

impl std::fmt::Display for ReleaseRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtLeast(min) => write!(f, "{min}"),
            Self::Between(min, max) => write!(f, "{min}-{max}"),
        }
    }
}

impl From<u32> for ReleaseRange {
    fn from(min: u32) -> Self {
        Self::AtLeast(min)
    }
}

impl From<(u32, u32)> for ReleaseRange {
    fn from((min, max): (u32, u32)) -> Self {
        Self::Between(min, max)
    }
}

/// Fail unless `current` falls inside `range`.
pub fn require_release(range: impl Into<ReleaseRange>, current: u32) -> Result<()> {
    let range = range.into();
    if range.contains(current) {
        Ok(())
    } else {
        Err(VorpleError::ReleaseMismatch {
            required: range.to_string(),
            current,
        })
    }
}
