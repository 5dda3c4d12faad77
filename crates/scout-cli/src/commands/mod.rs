//! CLI command implementations

mod chat;
mod config;
mod connect;
mod input;
mod models;
mod prompt;
mod scan;

use std::path::PathBuf;

use scout_client::{DiscoveryEngine, HttpProbe, SessionManager};
use scout_core::config::default_config_path;
use scout_core::Preferences;
use scout_protocol::{ChatMessage, ChatRequest, GenerateOptions, GenerateRequest};

pub use chat::chat_command;
pub use config::{config_path, config_set, config_show, config_unset};
pub use connect::establish;
pub use input::LineInput;
pub use models::{models_command, resolve_model};
pub use prompt::prompt_command;
pub use scan::scan_command;

/// Options shared by every command that talks to a server
#[derive(Debug, Clone)]
pub struct Settings {
    /// Preference file; the platform default when `None`
    pub config_path: Option<PathBuf>,
    /// Address to use instead of discovery
    pub host: Option<String>,
    /// Port for this run only
    pub port: Option<u16>,
    /// Requested model
    pub model: String,
    /// Discovery probes in flight at once
    pub parallel: usize,
    /// System prompt sent with every request
    pub system: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Settings {
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(default_config_path)
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::load(self.config_path()).with_port_override(self.port)
    }

    pub fn discovery_engine(&self) -> DiscoveryEngine<HttpProbe> {
        DiscoveryEngine::new(HttpProbe::new()).with_concurrency(self.parallel)
    }

    pub fn session_manager(&self) -> SessionManager<HttpProbe> {
        SessionManager::new(self.discovery_engine(), self.preferences())
    }

    fn options(&self) -> Option<GenerateOptions> {
        GenerateOptions {
            temperature: self.temperature,
        }
        .non_empty()
    }

    /// Streaming completion request for a single prompt
    pub fn generate_request(&self, model: &str, prompt: &str) -> GenerateRequest {
        let mut request = GenerateRequest::new(model, prompt, true);
        request.system = self.system.clone();
        request.options = self.options();
        request
    }

    /// Streaming chat request; the system prompt leads the conversation
    pub fn chat_request(&self, model: &str, conversation: &[ChatMessage]) -> ChatRequest {
        let messages = self
            .system
            .iter()
            .map(ChatMessage::system)
            .chain(conversation.iter().cloned())
            .collect();
        ChatRequest {
            options: self.options(),
            ..ChatRequest::new(model, messages, true)
        }
    }
}
