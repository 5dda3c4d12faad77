//! scout-core: Core types and connection preferences for ollama-scout
//!
//! This crate provides the preference record that survives between runs,
//! the candidate and session types shared by discovery and the CLI, and
//! the error types for preference file handling.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigKey, ConnectionConfig, Preferences, DEFAULT_PORT};
pub use error::ConfigError;
pub use types::{base_url, CandidateHost, CandidateOrigin, ServerSession};
