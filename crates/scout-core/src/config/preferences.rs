//! Preference state owned by one session

use std::path::{Path, PathBuf};

use super::ConnectionConfig;

/// The connection preferences of one session manager, with the file they
/// persist to
///
/// Each save writes the whole in-memory snapshot; when several processes
/// share a file the last writer wins.
#[derive(Debug, Clone)]
pub struct Preferences {
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
    /// Current snapshot
    config: ConnectionConfig,
    /// Port for this run only, never persisted
    port_override: Option<u16>,
}

impl Preferences {
    /// Load preferences from a file, falling back to defaults
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = ConnectionConfig::load(&path);
        Self {
            path: Some(path),
            config,
            port_override: None,
        }
    }

    /// Preferences that are never written to disk
    pub fn in_memory(config: ConnectionConfig) -> Self {
        Self {
            path: None,
            config,
            port_override: None,
        }
    }

    /// Use `port` for this run instead of the stored port
    pub fn with_port_override(mut self, port: Option<u16>) -> Self {
        self.port_override = port;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Port to use for this run
    pub fn port(&self) -> u16 {
        self.port_override.unwrap_or(self.config.port)
    }

    /// Remember `host` as the last known host
    ///
    /// The file is only rewritten when the value changes. Returns whether
    /// it changed.
    pub fn record_success(&mut self, host: &str) -> bool {
        if self.config.last_known_host.as_deref() == Some(host) {
            return false;
        }

        tracing::debug!("Remembering {} as last known host", host);
        self.config = self.config.clone().with_last_known(host);
        self.persist();
        true
    }

    /// Apply an edit and persist the result
    pub fn update<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut ConnectionConfig),
    {
        edit(&mut self.config);
        self.persist()
    }

    /// Write the snapshot to the backing file
    ///
    /// Returns `false` if the write failed; the failure is logged.
    pub fn persist(&self) -> bool {
        match &self.path {
            Some(path) => self.config.save(path),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigKey;

    #[test]
    fn test_port_override_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.conf");

        let mut prefs = Preferences::load(&path).with_port_override(Some(9999));
        assert_eq!(prefs.port(), 9999);

        assert!(prefs.record_success("10.0.0.9"));
        let stored = ConnectionConfig::load(&path);
        assert_eq!(stored.port, 11434);
        assert_eq!(stored.last_known_host.as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn test_record_success_skips_unchanged_host() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.conf");

        let mut prefs = Preferences::load(&path);
        assert!(prefs.record_success("localhost"));
        std::fs::remove_file(&path).unwrap();

        assert!(!prefs.record_success("localhost"));
        assert!(!path.exists());
    }

    #[test]
    fn test_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.conf");

        let mut first = Preferences::load(&path);
        let mut second = Preferences::load(&path);
        first.update(|c| c.set(ConfigKey::ForceIp, "10.0.0.1").unwrap());
        second.record_success("10.0.0.2");

        let stored = ConnectionConfig::load(&path);
        assert_eq!(stored.forced_host, None);
        assert_eq!(stored.last_known_host.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_in_memory_never_writes() {
        let mut prefs = Preferences::in_memory(ConnectionConfig::default());
        assert!(prefs.record_success("localhost"));
        assert_eq!(prefs.path(), None);
        assert_eq!(prefs.config().last_known_host.as_deref(), Some("localhost"));
    }
}
