//! Shared helpers for unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::probe::Probe;

/// Probe with scripted answers that records every call
#[derive(Default)]
pub struct FakeProbe {
    reachable: HashMap<String, bool>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn reachable(hosts: &[&str]) -> Self {
        let mut probe = Self::default();
        for host in hosts {
            probe.reachable.insert(host.to_string(), true);
        }
        probe
    }

    /// Delay the answer for `host`
    pub fn delay(mut self, host: &str, delay: Duration) -> Self {
        self.delays.insert(host.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn probe(&self, host: &str, _port: u16) -> bool {
        self.calls.lock().unwrap().push(host.to_string());
        if let Some(delay) = self.delays.get(host) {
            tokio::time::sleep(*delay).await;
        }
        self.reachable.get(host).copied().unwrap_or(false)
    }
}
