//! Reachability probe

use std::time::Duration;

use async_trait::async_trait;

use scout_core::base_url;

use crate::api::direct_client;

/// Time budget of a single probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Read-only endpoint used to check liveness
pub const LIVENESS_PATH: &str = "/api/tags";

/// Answers whether a host serves the API
///
/// Implementations must not retry and must return within their time
/// budget; every failure is reported as `false`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, host: &str, port: u16) -> bool;
}

/// Probe that issues `GET /api/tags`
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: direct_client(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, host: &str, port: u16) -> bool {
        let url = format!("{}{}", base_url(host, port), LIVENESS_PATH);

        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(host = %host, port, "Probe succeeded");
                true
            }
            Ok(response) => {
                tracing::debug!(host = %host, port, status = %response.status(), "Probe rejected");
                false
            }
            Err(e) => {
                tracing::debug!(host = %host, port, "Probe failed: {}", e);
                false
            }
        }
    }
}
