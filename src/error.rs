//! Errors the user can fix by changing the command line.
//!
//! Everything else (failed `ioreg`/`defaults` runs, undecodable property
//! lists) travels as `anyhow::Error` with context attached.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Remap must be in the format '<Source>:<Dest>', got '{0}'")]
    MalformedRemap(String),

    #[error("Unknown key name: '{0}'")]
    UnknownKeyName(String),
}
