//! Core error types for ollama-scout

use std::path::PathBuf;
use thiserror::Error;

/// Preference file errors
///
/// These never abort a session: callers log them and carry on with
/// defaults or the in-memory snapshot.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Preference file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Preference file could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unknown preference key
    #[error("Unknown key: {0} (expected LAST_IP, FORCE_IP, COMMON_IPS or PORT)")]
    UnknownKey(String),

    /// Invalid value for a known key
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
