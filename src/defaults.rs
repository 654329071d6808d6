//! Per-host global preferences, read and written through `defaults`.

use crate::ioreg::Keyboard;
use crate::remap::{self, RemapTable};
use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::{debug, info};

/// Preference key holding the modifier mapping for one keyboard.
pub fn preference_key(keyboard: &Keyboard) -> String {
    format!(
        "com.apple.keyboard.modifiermapping.{}-{}-0",
        keyboard.vendor_id, keyboard.product_id
    )
}

pub trait PreferenceStore {
    fn read(&self, keyboard: &Keyboard) -> Result<RemapTable>;
    fn write(&self, keyboard: &Keyboard, table: &RemapTable) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Defaults {
    pub program: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            program: "defaults".to_string(),
        }
    }
}

impl PreferenceStore for Defaults {
    fn read(&self, keyboard: &Keyboard) -> Result<RemapTable> {
        let key = preference_key(keyboard);
        debug!(program = %self.program, %key, "reading modifier mapping");

        let output = Command::new(&self.program)
            .args(["-currentHost", "read", "-g", &key])
            .output()
            .with_context(|| format!("Failed to execute '{}'", self.program))?;

        // Any non-zero exit is taken to mean the key was never written.
        if !output.status.success() {
            info!(%key, status = %output.status, "no existing modifier mapping");
            return Ok(Vec::new());
        }

        remap::decode(&output.stdout).with_context(|| format!("Failed to decode {}", key))
    }

    fn write(&self, keyboard: &Keyboard, table: &RemapTable) -> Result<()> {
        let key = preference_key(keyboard);
        let value = remap::encode(table)?;
        debug!(program = %self.program, %key, entries = table.len(), "writing modifier mapping");

        let output = Command::new(&self.program)
            .args(["-currentHost", "write", "-g", &key, &value])
            .output()
            .with_context(|| format!("Failed to execute '{}'", self.program))?;

        if !output.status.success() {
            bail!(
                "'{} write {}' failed ({}): {}",
                self.program,
                key,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard() -> Keyboard {
        Keyboard {
            name: "Apple Internal Keyboard / Trackpad".to_string(),
            vendor_id: 1452,
            product_id: 610,
        }
    }

    #[test]
    fn preference_key_combines_vendor_and_product() {
        assert_eq!(
            preference_key(&keyboard()),
            "com.apple.keyboard.modifiermapping.1452-610-0"
        );
    }

    #[test]
    fn preference_key_ignores_name() {
        let mut renamed = keyboard();
        renamed.name = "Something Else".to_string();
        assert_eq!(preference_key(&renamed), preference_key(&keyboard()));
    }

    #[test]
    fn read_reports_missing_program() {
        let defaults = Defaults {
            program: "/nonexistent/modmap-defaults".to_string(),
        };
        assert!(defaults.read(&keyboard()).is_err());
        assert!(defaults.write(&keyboard(), &Vec::new()).is_err());
    }
}
