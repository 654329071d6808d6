//! Modifier mapping tables: property-list codec and the merge that keeps one
//! entry per source key.

use crate::keys::KeyCode;
use anyhow::{anyhow, Context, Result};
use plist::{Dictionary, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;

// Field names read by the macOS keyboard subsystem. Must match byte for byte.
pub const SRC_KEY: &str = "HIDKeyboardModifierMappingSrc";
pub const DST_KEY: &str = "HIDKeyboardModifierMappingDst";

/// When `src` is pressed, report `dst` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RemapEntry {
    #[serde(rename = "HIDKeyboardModifierMappingSrc")]
    pub src: KeyCode,
    #[serde(rename = "HIDKeyboardModifierMappingDst")]
    pub dst: KeyCode,
}

pub type RemapTable = Vec<RemapEntry>;

/// Merge `entry` into `existing`, replacing any entry with the same source.
///
/// The result never holds two entries for one source. Callers must not rely
/// on its order.
pub fn merge(existing: &[RemapEntry], entry: RemapEntry) -> RemapTable {
    let mut by_src: BTreeMap<KeyCode, RemapEntry> = BTreeMap::new();
    for e in existing.iter().chain(std::iter::once(&entry)) {
        by_src.insert(e.src, *e);
    }
    by_src.into_values().collect()
}

/// Encode a table as an XML property list, the form `defaults write` takes.
pub fn encode(table: &[RemapEntry]) -> Result<String> {
    let mut buf = Vec::new();
    plist::to_writer_xml(&mut buf, &table).context("Failed to encode modifier mapping")?;
    String::from_utf8(buf).context("Encoded modifier mapping is not UTF-8")
}

/// Decode a table from any property-list encoding (XML, binary, or the
/// OpenStep text `defaults read` prints). Empty input is an empty table.
pub fn decode(bytes: &[u8]) -> Result<RemapTable> {
    if is_empty_value(bytes) {
        return Ok(Vec::new());
    }

    let value = Value::from_reader(Cursor::new(bytes))
        .context("Failed to parse modifier mapping property list")?;
    let items = value
        .into_array()
        .ok_or_else(|| anyhow!("Modifier mapping is not an array"))?;

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let dict = item
                .into_dictionary()
                .ok_or_else(|| anyhow!("Modifier mapping entry {} is not a dictionary", i))?;
            Ok(RemapEntry {
                src: integer_field(&dict, SRC_KEY).with_context(|| format!("entry {}", i))?,
                dst: integer_field(&dict, DST_KEY).with_context(|| format!("entry {}", i))?,
            })
        })
        .collect()
}

// Nothing at all, or the `(\n)` that `defaults read` prints for an empty
// array. The latter is too short for plist's format sniffing.
fn is_empty_value(bytes: &[u8]) -> bool {
    let mut rest = bytes.iter().filter(|b| !b.is_ascii_whitespace());
    match rest.next() {
        None => true,
        Some(b'(') => rest.next() == Some(&b')') && rest.next().is_none(),
        Some(_) => false,
    }
}

// OpenStep text has no integer type, so numbers may come back as strings.
fn integer_field(dict: &Dictionary, key: &str) -> Result<KeyCode> {
    let value = dict
        .get(key)
        .ok_or_else(|| anyhow!("Missing field {}", key))?;

    value
        .as_signed_integer()
        .or_else(|| value.as_string().and_then(|s| s.trim().parse().ok()))
        .map(KeyCode)
        .ok_or_else(|| anyhow!("Field {} is not an integer", key))
}
