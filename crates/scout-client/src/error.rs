//! Client error types

use thiserror::Error;

/// A discovery pass found no reachable server
///
/// Recoverable: callers may ask for an address and retry with it forced.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An explicitly requested host did not answer
    #[error("Could not connect to {host}:{port}")]
    ForcedHostUnreachable { host: String, port: u16 },

    /// Every candidate was probed without success
    #[error("No Ollama server found ({attempted} candidate(s) tried on port {port})")]
    Exhausted { attempted: usize, port: u16 },
}

/// Errors from the Ollama HTTP API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Ollama API error: {0}")]
    Api(String),

    #[error("Server returned an empty response")]
    EmptyResponse,
}

/// Errors surfaced by the session manager
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session has been established
    #[error("Not connected to an Ollama server")]
    NotConnected,

    /// The manager is connecting or generating
    #[error("Session is busy")]
    Busy,

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
