//! scout-client: Find an Ollama server and talk to it
//!
//! Discovery walks an ordered, deduplicated list of candidate hosts
//! (forced host, last known host, common hosts, then a sweep of the local
//! /24) and stops at the first one that answers. The session manager
//! keeps the resulting binding and drives streaming generations against
//! it.

pub mod api;
pub mod candidates;
pub mod discovery;
pub mod error;
pub mod models;
pub mod probe;
pub mod session;

#[cfg(test)]
mod test_support;

pub use api::{OllamaClient, ResponseStream, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT};
pub use candidates::{CandidateGenerator, LocalAddress, RouteLookup, SWEEP_SUFFIXES};
pub use discovery::{DiscoveryEngine, DEFAULT_CONCURRENCY};
pub use error::{ApiError, DiscoveryError, SessionError};
pub use models::{select_model, ModelSelection};
pub use probe::{HttpProbe, Probe, DEFAULT_PROBE_TIMEOUT};
pub use session::{GenerationCycle, SessionManager, SessionState};
