//! Keyboard discovery through the I/O Registry (`ioreg`).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::Cursor;
use std::process::Command;
use tracing::{debug, warn};

// Keyboard-class services, matched subtrees included, as an XML plist.
const IOREG_ARGS: &[&str] = &["-n", "IOHIDKeyboard", "-a", "-r"];

/// One attached keyboard as the I/O Registry reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub name: String,
    pub vendor_id: i64,
    pub product_id: i64,
}

#[derive(Deserialize)]
struct IoregRecord {
    #[serde(rename = "Product", default)]
    name: String,
    #[serde(rename = "VendorID")]
    vendor_id: Option<i64>,
    #[serde(rename = "ProductID")]
    product_id: Option<i64>,
}

pub trait KeyboardSource {
    fn list_keyboards(&self) -> Result<Vec<Keyboard>>;
}

#[derive(Debug, Clone)]
pub struct Ioreg {
    pub program: String,
}

impl Default for Ioreg {
    fn default() -> Self {
        Self {
            program: "ioreg".to_string(),
        }
    }
}

impl KeyboardSource for Ioreg {
    fn list_keyboards(&self) -> Result<Vec<Keyboard>> {
        debug!(program = %self.program, args = ?IOREG_ARGS, "enumerating keyboards");

        let output = Command::new(&self.program)
            .args(IOREG_ARGS)
            .output()
            .with_context(|| format!("Failed to execute '{}'", self.program))?;

        if !output.status.success() {
            bail!(
                "'{}' failed ({}): {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let keyboards = parse_keyboards(&output.stdout)?;
        debug!(count = keyboards.len(), "decoded keyboards");
        Ok(keyboards)
    }
}

/// Decode `ioreg -a` output. No output at all means nothing matched.
///
/// Records without a vendor or product id have no preference key, so they
/// are skipped rather than failing the whole enumeration.
pub fn parse_keyboards(bytes: &[u8]) -> Result<Vec<Keyboard>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let records: Vec<IoregRecord> =
        plist::from_reader(Cursor::new(bytes)).context("Failed to decode ioreg output")?;

    Ok(records
        .into_iter()
        .filter_map(|record| match (record.vendor_id, record.product_id) {
            (Some(vendor_id), Some(product_id)) => Some(Keyboard {
                name: record.name,
                vendor_id,
                product_id,
            }),
            (vendor_id, product_id) => {
                warn!(
                    name = %record.name,
                    ?vendor_id,
                    ?product_id,
                    "skipping keyboard without ids"
                );
                None
            }
        })
        .collect())
}
