//! Server discovery
//!
//! One discovery pass probes candidates in priority order and stops at the
//! first host that answers. Probes may run concurrently (see
//! [`DiscoveryEngine::with_concurrency`]), but results are consumed in
//! candidate order: a higher-priority host that answers always wins, and
//! probes still in flight when it does are dropped.

use futures::stream::{self, StreamExt};

use scout_core::{CandidateHost, ConnectionConfig, Preferences, ServerSession};

use crate::candidates::CandidateGenerator;
use crate::error::DiscoveryError;
use crate::probe::Probe;

/// Probes in flight at once by default
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Locates a reachable server and records it in the preferences
pub struct DiscoveryEngine<P> {
    probe: P,
    generator: CandidateGenerator,
    concurrency: usize,
}

impl<P: Probe> DiscoveryEngine<P> {
    /// Create an engine that probes one candidate at a time
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            generator: CandidateGenerator::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Use a custom candidate generator
    pub fn with_generator(mut self, generator: CandidateGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Allow up to `concurrency` probes in flight
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Candidates a pass over `config` would try, in order
    pub fn candidates(&self, config: &ConnectionConfig) -> Vec<CandidateHost> {
        self.generator.generate(config)
    }

    /// Run one discovery pass
    ///
    /// With `force_host`, only that host is probed and a failure is
    /// reported without trying anything else. On success the host is
    /// remembered as the last known host.
    pub async fn discover(
        &self,
        prefs: &mut Preferences,
        force_host: Option<&str>,
    ) -> Result<ServerSession, DiscoveryError> {
        let port = prefs.port();

        if let Some(host) = force_host.map(str::trim).filter(|h| !h.is_empty()) {
            tracing::info!("Trying requested host {}:{}", host, port);
            if !self.probe.probe(host, port).await {
                return Err(DiscoveryError::ForcedHostUnreachable {
                    host: host.to_string(),
                    port,
                });
            }
            prefs.record_success(host);
            return Ok(ServerSession::new(host, port));
        }

        let candidates = self.candidates(prefs.config());
        let attempted = candidates.len();
        tracing::debug!("Discovering server among {} candidate(s)", attempted);

        let found = self.first_reachable(candidates, port).await;
        let Some(candidate) = found else {
            return Err(DiscoveryError::Exhausted { attempted, port });
        };

        tracing::info!(
            host = %candidate.address,
            origin = %candidate.origin,
            "Found server at {}:{}",
            candidate.address,
            port
        );
        prefs.record_success(&candidate.address);
        Ok(ServerSession::new(candidate.address, port))
    }

    /// Probe every candidate and return those that answered, in order
    ///
    /// Unlike [`discover`](Self::discover) this does not stop early and
    /// does not touch the preferences.
    pub async fn scan(&self, config: &ConnectionConfig, port: u16) -> Vec<CandidateHost> {
        let candidates = self.candidates(config);
        tracing::debug!("Scanning {} candidate(s)", candidates.len());

        stream::iter(candidates)
            .map(|candidate| self.check(candidate, port))
            .buffered(self.concurrency)
            .filter_map(|(candidate, reachable)| async move { reachable.then_some(candidate) })
            .collect()
            .await
    }

    async fn first_reachable(
        &self,
        candidates: Vec<CandidateHost>,
        port: u16,
    ) -> Option<CandidateHost> {
        let mut results = stream::iter(candidates)
            .map(|candidate| self.check(candidate, port))
            .buffered(self.concurrency);

        while let Some((candidate, reachable)) = results.next().await {
            if reachable {
                return Some(candidate);
            }
        }
        None
    }

    async fn check(&self, candidate: CandidateHost, port: u16) -> (CandidateHost, bool) {
        tracing::debug!(origin = %candidate.origin, "Testing {}", candidate.address);
        let reachable = self.probe.probe(&candidate.address, port).await;
        (candidate, reachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use crate::test_support::FakeProbe;

    fn engine(probe: FakeProbe) -> DiscoveryEngine<FakeProbe> {
        DiscoveryEngine::new(probe)
            .with_generator(CandidateGenerator::with_local_address(None::<Ipv4Addr>))
    }

    fn prefs(forced: Option<&str>, last: Option<&str>, common: &[&str]) -> Preferences {
        Preferences::in_memory(ConnectionConfig {
            forced_host: forced.map(String::from),
            last_known_host: last.map(String::from),
            common_hosts: common.iter().map(|h| h.to_string()).collect(),
            port: 11434,
        })
    }

    #[tokio::test]
    async fn test_reachable_forced_host_is_only_probe() {
        let engine = engine(FakeProbe::reachable(&["10.0.0.5", "10.0.0.9", "localhost"]));
        let mut prefs = prefs(Some("10.0.0.5"), Some("10.0.0.9"), &["localhost"]);

        let session = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(session.host(), "10.0.0.5");
        assert_eq!(engine.probe().calls(), vec!["10.0.0.5"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_last_known() {
        let engine = engine(FakeProbe::reachable(&["10.0.0.9", "localhost"]));
        let mut prefs = prefs(Some("10.0.0.5"), Some("10.0.0.9"), &["localhost", "127.0.0.1"]);

        let session = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(session.host(), "10.0.0.9");
        assert_eq!(engine.probe().calls(), vec!["10.0.0.5", "10.0.0.9"]);
    }

    #[tokio::test]
    async fn test_last_known_skips_common_and_sweep() {
        let probe = FakeProbe::reachable(&["10.0.0.9", "localhost", "192.168.0.1"]);
        let engine = DiscoveryEngine::new(probe).with_generator(
            CandidateGenerator::with_local_address(Some(Ipv4Addr::new(192, 168, 0, 20))),
        );
        let mut prefs = prefs(None, Some("10.0.0.9"), &["localhost"]);

        let session = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(session.host(), "10.0.0.9");
        assert_eq!(engine.probe().calls(), vec!["10.0.0.9"]);
    }

    #[tokio::test]
    async fn test_common_host_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.conf");
        let mut prefs = Preferences::load(&path);
        let engine = engine(FakeProbe::reachable(&["localhost"]));

        let session = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(session.host(), "localhost");
        assert_eq!(session.port(), 11434);
        assert_eq!(prefs.config().last_known_host.as_deref(), Some("localhost"));

        let stored = ConnectionConfig::load(&path);
        assert_eq!(stored.last_known_host.as_deref(), Some("localhost"));
    }

    #[tokio::test]
    async fn test_exhausted() {
        let probe = FakeProbe::default();
        let engine = DiscoveryEngine::new(probe).with_generator(
            CandidateGenerator::with_local_address(Some(Ipv4Addr::new(10, 0, 0, 7))),
        );
        let mut prefs = prefs(Some("10.0.0.5"), Some("10.0.0.9"), &["localhost"]);

        let err = engine.discover(&mut prefs, None).await.unwrap_err();
        let expected = 3 + crate::candidates::SWEEP_SUFFIXES.len() + 1;
        assert!(matches!(
            err,
            DiscoveryError::Exhausted { attempted, port: 11434 } if attempted == expected
        ));
        // One attempt per candidate
        assert_eq!(engine.probe().calls().len(), expected);
        assert_eq!(prefs.config().last_known_host.as_deref(), Some("10.0.0.9"));
    }

    #[tokio::test]
    async fn test_explicit_host_has_no_fallback() {
        let engine = engine(FakeProbe::reachable(&["localhost"]));
        let mut prefs = prefs(None, None, &["localhost"]);

        let err = engine
            .discover(&mut prefs, Some("192.168.9.9"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::ForcedHostUnreachable { ref host, .. } if host == "192.168.9.9"
        ));
        assert_eq!(engine.probe().calls(), vec!["192.168.9.9"]);
    }

    #[tokio::test]
    async fn test_explicit_host_becomes_last_known() {
        let engine = engine(FakeProbe::reachable(&["192.168.9.9"]));
        let mut prefs = prefs(None, Some("10.0.0.9"), &[]);

        let session = engine
            .discover(&mut prefs, Some("192.168.9.9"))
            .await
            .unwrap();
        assert_eq!(session.host(), "192.168.9.9");
        assert_eq!(
            prefs.config().last_known_host.as_deref(),
            Some("192.168.9.9")
        );
    }

    #[tokio::test]
    async fn test_repeated_discovery_is_stable() {
        let engine = engine(FakeProbe::reachable(&["127.0.0.1"]));
        let mut prefs = prefs(None, None, &["localhost", "127.0.0.1"]);

        let first = engine.discover(&mut prefs, None).await.unwrap();
        let second = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(first.host(), second.host());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_probes_keep_priority() {
        // The lower-priority host answers first but must not win
        let probe = FakeProbe::reachable(&["slow-primary", "fast-secondary"])
            .delay("slow-primary", Duration::from_millis(1500))
            .delay("fast-secondary", Duration::from_millis(10));
        let engine = engine(probe).with_concurrency(4);
        let mut prefs = prefs(None, None, &["slow-primary", "fast-secondary"]);

        let session = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(session.host(), "slow-primary");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_probes_skip_unreachable() {
        let probe = FakeProbe::reachable(&["b", "c"])
            .delay("a", Duration::from_millis(2000))
            .delay("c", Duration::from_millis(5));
        let engine = engine(probe).with_concurrency(3);
        let mut prefs = prefs(None, None, &["a", "b", "c"]);

        let session = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(session.host(), "b");
    }

    #[tokio::test]
    async fn test_scan_returns_all_reachable_in_order() {
        let engine = engine(FakeProbe::reachable(&["c", "a"])).with_concurrency(2);
        let config = ConnectionConfig {
            forced_host: None,
            last_known_host: None,
            common_hosts: vec!["a".into(), "b".into(), "c".into()],
            port: 11434,
        };

        let found = engine.scan(&config, 11434).await;
        let hosts: Vec<_> = found.iter().map(|c| c.address.as_str()).collect();
        assert_eq!(hosts, vec!["a", "c"]);
        assert_eq!(engine.probe().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_port_override_used_for_session() {
        let engine = engine(FakeProbe::reachable(&["localhost"]));
        let mut prefs = prefs(None, None, &["localhost"]).with_port_override(Some(8080));

        let session = engine.discover(&mut prefs, None).await.unwrap();
        assert_eq!(session.port(), 8080);
        assert_eq!(session.base_url(), "http://localhost:8080");
    }
}
