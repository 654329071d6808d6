//! Modifier key names understood by the macOS HID modifier remapping.
//!
//! The codes are the small modifier indices the keyboard preference pane
//! stores, not USB HID usages.

use crate::error::UsageError;
use crate::remap::RemapEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Modifier role as stored in `HIDKeyboardModifierMapping{Src,Dst}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub i64);

impl KeyCode {
    /// Disables the source key.
    pub const NONE: KeyCode = KeyCode(-1);
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match name_of(*self) {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

static KEY_NAMES: &[(&str, KeyCode)] = &[
    ("none", KeyCode::NONE),
    ("caps", KeyCode(0)),
    ("shift_l", KeyCode(1)),
    ("control_l", KeyCode(2)),
    ("option_l", KeyCode(3)),
    ("command_l", KeyCode(4)),
    ("keypad_0", KeyCode(5)),
    ("help", KeyCode(6)),
    ("shift_r", KeyCode(9)),
    ("control_r", KeyCode(10)),
    ("option_r", KeyCode(11)),
    ("command_r", KeyCode(12)),
    ("kernel_panic", KeyCode(16)),
];

/// Look up a key name. Names are exact and case-sensitive.
pub fn resolve(name: &str) -> Result<KeyCode, UsageError> {
    KEY_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
        .ok_or_else(|| UsageError::UnknownKeyName(name.to_string()))
}

pub fn name_of(code: KeyCode) -> Option<&'static str> {
    KEY_NAMES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// All known names with their codes, in table order.
pub fn names() -> impl Iterator<Item = (&'static str, KeyCode)> {
    KEY_NAMES.iter().copied()
}

/// Parse a `<source>:<dest>` remap request.
pub fn parse_remap(spec: &str) -> Result<RemapEntry, UsageError> {
    let (src, dst) = spec
        .split_once(':')
        .ok_or_else(|| UsageError::MalformedRemap(spec.to_string()))?;

    Ok(RemapEntry {
        src: resolve(src)?,
        dst: resolve(dst)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_every_known_name() {
        for (name, code) in names() {
            assert_eq!(resolve(name).unwrap(), code, "{name}");
        }
        assert_eq!(names().count(), 13);
    }

    #[test]
    fn resolve_sentinel_and_sides() {
        assert_eq!(resolve("none").unwrap(), KeyCode::NONE);
        assert_eq!(resolve("caps").unwrap(), KeyCode(0));
        assert_eq!(resolve("command_r").unwrap(), KeyCode(12));
        assert_eq!(resolve("kernel_panic").unwrap(), KeyCode(16));
    }

    #[test]
    fn resolve_rejects_unknown_empty_and_case_variants() {
        for name in ["", "ctrl", "Shift_L", "SHIFT_L", "shift_l ", " caps"] {
            assert_eq!(
                resolve(name),
                Err(UsageError::UnknownKeyName(name.to_string())),
                "{name:?}"
            );
        }
    }

    #[test]
    fn name_of_round_trips_codes() {
        assert_eq!(name_of(KeyCode(2)), Some("control_l"));
        assert_eq!(name_of(KeyCode(7)), None);
        assert_eq!(KeyCode(1).to_string(), "shift_l (1)");
        assert_eq!(KeyCode(42).to_string(), "42");
    }

    #[test]
    fn parse_remap_shift_to_control() {
        let entry = parse_remap("shift_l:control_l").unwrap();
        assert_eq!(entry.src, KeyCode(1));
        assert_eq!(entry.dst, KeyCode(2));
    }

    #[test]
    fn parse_remap_allows_disable_and_self_map() {
        assert_eq!(parse_remap("caps:none").unwrap().dst, KeyCode::NONE);
        let same = parse_remap("option_r:option_r").unwrap();
        assert_eq!(same.src, same.dst);
    }

    #[test]
    fn parse_remap_requires_separator() {
        assert_eq!(
            parse_remap("shift_l"),
            Err(UsageError::MalformedRemap("shift_l".to_string()))
        );
    }

    #[test]
    fn parse_remap_rejects_unknown_halves() {
        assert_eq!(
            parse_remap("shift_l:"),
            Err(UsageError::UnknownKeyName(String::new()))
        );
        assert_eq!(
            parse_remap("hyper:caps"),
            Err(UsageError::UnknownKeyName("hyper".to_string()))
        );
        assert_eq!(
            parse_remap("caps:control_l:shift_l"),
            Err(UsageError::UnknownKeyName("control_l:shift_l".to_string()))
        );
    }
}
