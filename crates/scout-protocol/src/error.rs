//! Protocol error types

use thiserror::Error;

/// Errors that can occur while reading a response stream
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A single record grew past the allowed size without a line break
    #[error("Record too large: {size} bytes exceeds maximum of {max} bytes")]
    RecordTooLarge { size: usize, max: usize },

    /// I/O error from the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
