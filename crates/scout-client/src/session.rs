//! Session management
//!
//! [`SessionManager`] owns the preferences, the current server binding and
//! the state machine
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> (Generating -> Connected)* -> Disconnected
//! ```
//!
//! A generation borrows the manager for as long as its [`GenerationCycle`]
//! lives, so the binding cannot change under an open stream.

use std::fmt;

use tokio_util::sync::CancellationToken;

use scout_core::{Preferences, ServerSession};
use scout_protocol::{ChatRequest, GenerateRequest, GenerationResult, ModelInfo, StreamEvent};

use crate::api::{OllamaClient, ResponseStream};
use crate::discovery::DiscoveryEngine;
use crate::error::SessionError;
use crate::models::{select_model, ModelSelection};
use crate::probe::Probe;

/// Where the manager is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Generating,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Generating => write!(f, "generating"),
        }
    }
}

/// Sets a state for the lifetime of the guard and restores a fallback
/// state when dropped
struct StateGuard<'a> {
    state: &'a mut SessionState,
    fallback: SessionState,
}

impl<'a> StateGuard<'a> {
    fn enter(state: &'a mut SessionState, current: SessionState, fallback: SessionState) -> Self {
        tracing::trace!("Session state {} -> {}", state, current);
        *state = current;
        Self { state, fallback }
    }

    /// Leave with `next` instead of the fallback
    fn leave(mut self, next: SessionState) {
        self.fallback = next;
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        tracing::trace!("Session state {} -> {}", self.state, self.fallback);
        *self.state = self.fallback;
    }
}

enum StreamRequest {
    Generate(GenerateRequest),
    Chat(ChatRequest),
}

/// Drives discovery and generation for one interactive session
pub struct SessionManager<P> {
    engine: DiscoveryEngine<P>,
    prefs: Preferences,
    state: SessionState,
    session: Option<ServerSession>,
    client: Option<OllamaClient>,
}

impl<P: Probe> SessionManager<P> {
    pub fn new(engine: DiscoveryEngine<P>, prefs: Preferences) -> Self {
        Self {
            engine,
            prefs,
            state: SessionState::Disconnected,
            session: None,
            client: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current binding, if connected
    pub fn session(&self) -> Option<&ServerSession> {
        self.session.as_ref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn engine(&self) -> &DiscoveryEngine<P> {
        &self.engine
    }

    /// Run discovery and bind to the server it finds
    ///
    /// Any previous binding is discarded first. On failure the manager is
    /// left disconnected and the caller may retry, typically with a host
    /// entered by the user as `force_host`.
    pub async fn connect(
        &mut self,
        force_host: Option<&str>,
    ) -> Result<&ServerSession, SessionError> {
        if matches!(self.state, SessionState::Connecting | SessionState::Generating) {
            return Err(SessionError::Busy);
        }

        let Self {
            engine,
            prefs,
            state,
            session,
            client,
        } = self;

        *session = None;
        *client = None;

        let guard = StateGuard::enter(state, SessionState::Connecting, SessionState::Disconnected);
        let found = engine.discover(prefs, force_host).await?;
        guard.leave(SessionState::Connected);

        tracing::info!("Connected to {}", found);
        *client = Some(OllamaClient::for_session(&found));
        Ok(session.insert(found))
    }

    /// Discard the current binding and run discovery again
    pub async fn reconnect(&mut self) -> Result<&ServerSession, SessionError> {
        tracing::info!("Reconnecting");
        self.connect(None).await
    }

    /// Drop the current binding
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        if matches!(self.state, SessionState::Connecting | SessionState::Generating) {
            return Err(SessionError::Busy);
        }
        self.session = None;
        self.client = None;
        self.state = SessionState::Disconnected;
        Ok(())
    }

    /// Models listed by the connected server
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, SessionError> {
        let client = self.connected_client()?;
        Ok(client.list_models().await?)
    }

    /// Resolve `requested` against the connected server's models
    pub async fn resolve_model(&self, requested: &str) -> Result<ModelSelection, SessionError> {
        let models = self.list_models().await?;
        Ok(select_model(requested, &models))
    }

    /// Open a streaming generation against the current binding
    pub async fn begin_generate(
        &mut self,
        request: GenerateRequest,
        cancel: CancellationToken,
    ) -> Result<GenerationCycle<'_>, SessionError> {
        self.open_cycle(StreamRequest::Generate(request), cancel).await
    }

    /// Open a streaming chat reply against the current binding
    pub async fn begin_chat(
        &mut self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<GenerationCycle<'_>, SessionError> {
        self.open_cycle(StreamRequest::Chat(request), cancel).await
    }

    /// Stream a completion, passing each fragment to `on_fragment`
    pub async fn generate<F>(
        &mut self,
        request: GenerateRequest,
        cancel: CancellationToken,
        on_fragment: F,
    ) -> Result<GenerationResult, SessionError>
    where
        F: FnMut(&str),
    {
        let cycle = self.begin_generate(request, cancel).await?;
        Ok(cycle.finish_with(on_fragment).await)
    }

    /// Stream the assistant's reply to a conversation
    pub async fn chat<F>(
        &mut self,
        request: ChatRequest,
        cancel: CancellationToken,
        on_fragment: F,
    ) -> Result<GenerationResult, SessionError>
    where
        F: FnMut(&str),
    {
        let cycle = self.begin_chat(request, cancel).await?;
        Ok(cycle.finish_with(on_fragment).await)
    }

    async fn open_cycle(
        &mut self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> Result<GenerationCycle<'_>, SessionError> {
        let Self {
            state,
            session,
            client,
            ..
        } = self;

        match *state {
            SessionState::Connected => {}
            SessionState::Connecting | SessionState::Generating => {
                return Err(SessionError::Busy)
            }
            SessionState::Disconnected => return Err(SessionError::NotConnected),
        }
        let (Some(session), Some(client)) = (session.as_ref(), client.as_ref()) else {
            return Err(SessionError::NotConnected);
        };

        let guard = StateGuard::enter(state, SessionState::Generating, SessionState::Connected);
        let decoder = match &request {
            StreamRequest::Generate(request) => client.generate_stream(request, cancel).await?,
            StreamRequest::Chat(request) => client.chat_stream(request, cancel).await?,
        };

        Ok(GenerationCycle {
            decoder,
            session,
            _guard: guard,
        })
    }

    fn connected_client(&self) -> Result<&OllamaClient, SessionError> {
        match (self.state, self.client.as_ref()) {
            (SessionState::Connected, Some(client)) => Ok(client),
            (SessionState::Connecting | SessionState::Generating, _) => Err(SessionError::Busy),
            _ => Err(SessionError::NotConnected),
        }
    }
}

/// One open generation
///
/// The manager returns to `Connected` when the cycle is finished or
/// dropped.
pub struct GenerationCycle<'a> {
    decoder: ResponseStream,
    session: &'a ServerSession,
    _guard: StateGuard<'a>,
}

impl GenerationCycle<'_> {
    /// Server this cycle is bound to
    pub fn session(&self) -> &ServerSession {
        self.session
    }

    /// Read the next event; `None` once the stream has ended
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.decoder.next_event().await
    }

    /// Text assembled so far
    pub fn text(&self) -> &str {
        self.decoder.text()
    }

    /// Drain the stream, passing each fragment to `on_fragment`
    pub async fn finish_with<F>(self, on_fragment: F) -> GenerationResult
    where
        F: FnMut(&str),
    {
        self.decoder.collect_with(on_fragment).await
    }

    /// Stop reading and return what has been assembled
    pub fn finish(self) -> GenerationResult {
        self.decoder.into_result()
    }
}
