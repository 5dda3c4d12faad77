//! Ollama HTTP API client

use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use scout_core::ServerSession;
use scout_protocol::{
    ChatMessage, ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, ModelInfo,
    StreamDecoder, TagsResponse,
};

use crate::error::ApiError;

/// Overall budget of a generation request, streaming included
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Budget of a model listing request
pub const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Model used when none is requested
pub const DEFAULT_MODEL: &str = "tinyllama:latest";

/// Body of a streaming response, as an async reader
pub type ResponseReader = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// Decoder over a streaming response
pub type ResponseStream = StreamDecoder<ResponseReader>;

/// Error body returned by the server with a non-success status
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client bound to one server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for `base_url`, e.g. `http://localhost:11434`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: direct_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client for an established session
    pub fn for_session(session: &ServerSession) -> Self {
        Self::new(session.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the models the server has available
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(MODEL_LIST_TIMEOUT)
            .send()
            .await?;
        let tags: TagsResponse = check_status(response).await?.json().await?;

        tracing::debug!("Server lists {} model(s)", tags.models.len());
        Ok(tags.models)
    }

    /// Generate a completion in one response
    pub async fn generate(&self, request: &GenerateRequest) -> Result<String, ApiError> {
        let request = GenerateRequest {
            stream: false,
            ..request.clone()
        };
        let response: GenerateResponse = self.post_json("/api/generate", &request).await?;

        if let Some(error) = response.error {
            return Err(ApiError::Api(error));
        }
        Ok(response.response)
    }

    /// Start a streaming completion
    ///
    /// The returned decoder owns the connection until it is finished or
    /// dropped.
    pub async fn generate_stream(
        &self,
        request: &GenerateRequest,
        cancel: CancellationToken,
    ) -> Result<ResponseStream, ApiError> {
        let request = GenerateRequest {
            stream: true,
            ..request.clone()
        };
        self.post_stream("/api/generate", &request, cancel).await
    }

    /// Send a conversation and get the assistant's reply in one response
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatMessage, ApiError> {
        let request = ChatRequest {
            stream: false,
            ..request.clone()
        };
        let response: ChatResponse = self.post_json("/api/chat", &request).await?;

        if let Some(error) = response.error {
            return Err(ApiError::Api(error));
        }
        response.message.ok_or(ApiError::EmptyResponse)
    }

    /// Start a streaming chat reply
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ResponseStream, ApiError> {
        let request = ChatRequest {
            stream: true,
            ..request.clone()
        };
        self.post_stream("/api/chat", &request, cancel).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn post_stream<B>(
        &self,
        path: &str,
        body: &B,
        cancel: CancellationToken,
    ) -> Result<ResponseStream, ApiError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!("Opening stream {}{}", self.base_url, path);
        let request = self
            .client
            .post(self.url(path))
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .json(body)
            .send();

        // Cancellation also covers the wait for response headers
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Stream cancelled before the server answered");
                return Ok(StreamDecoder::cancelled(cancel));
            }
            response = request => check_status(response?).await?,
        };

        let body = response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other));
        let reader = StreamReader::new(body.boxed());
        Ok(StreamDecoder::new(reader, cancel))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// HTTP client that ignores proxy settings from the environment
///
/// Servers live on the local network, where a proxy cannot reach them or
/// answers on their behalf.
pub(crate) fn direct_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {}", e);
        reqwest::Client::default()
    })
}

/// Turn a non-success status into an error, using the server's message
/// when it sent one
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.trim().to_string(),
    };
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
