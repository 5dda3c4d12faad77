//! scout-protocol: Wire protocol for the Ollama HTTP API
//!
//! This crate defines the request/response bodies exchanged with an
//! Ollama server and the decoder for its newline-delimited streaming
//! responses.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod event;
pub mod message;

pub use codec::{Record, RecordCodec, MAX_RECORD_SIZE};
pub use decoder::StreamDecoder;
pub use error::ProtocolError;
pub use event::{GenerationResult, StreamEvent};
pub use message::{
    ChatMessage, ChatRequest, ChatResponse, GenerateOptions, GenerateRequest, GenerateResponse,
    ModelInfo, TagsResponse,
};
