//! ollama-scout: Command-line client for Ollama servers on the local network
//!
//! Finds a reachable server, remembers it between runs and streams
//! replies from it.

pub mod commands;
pub mod output;
