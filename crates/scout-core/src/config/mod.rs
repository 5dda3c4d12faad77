//! Connection preferences for ollama-scout
//!
//! The preference file is line-oriented `KEY=VALUE` text. Blank lines and
//! `#` comments are accepted on read and regenerated on save; they carry
//! no meaning.

mod key;
mod preferences;

pub use key::ConfigKey;
pub use preferences::Preferences;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default Ollama service port
pub const DEFAULT_PORT: u16 = 11434;

/// File name of the preference file inside the config directory
pub const CONFIG_FILE_NAME: &str = "ollama_connection.conf";

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ollama-scout")
}

/// Get the default preference file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE_NAME)
}

fn default_common_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

/// Durable connection preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Host tried before every other tier (`FORCE_IP`)
    pub forced_host: Option<String>,
    /// Last host that answered (`LAST_IP`)
    pub last_known_host: Option<String>,
    /// Hosts tried after the last known host (`COMMON_IPS`)
    pub common_hosts: Vec<String>,
    /// Service port (`PORT`)
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            forced_host: None,
            last_known_host: None,
            common_hosts: default_common_hosts(),
            port: DEFAULT_PORT,
        }
    }
}

impl ConnectionConfig {
    /// Load preferences, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_else(|e| {
            tracing::warn!("Could not read preferences, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load preferences; a missing file yields defaults
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No preference file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // Invalid UTF-8 only spoils the lines it appears on
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Parse preference file content
    ///
    /// Unknown keys and lines without `=` are ignored. A value that fails
    /// to parse leaves that field at its default.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!("Ignoring preference line without '=': {}", line);
                continue;
            };

            let key = match key.parse::<ConfigKey>() {
                Ok(key) => key,
                Err(e) => {
                    tracing::debug!("Ignoring preference line: {}", e);
                    continue;
                }
            };

            if let Err(e) = config.set(key, value) {
                tracing::warn!("{}; keeping default", e);
            }
        }

        config
    }

    /// Save preferences, logging instead of failing
    ///
    /// Returns whether the file was written.
    pub fn save(&self, path: &Path) -> bool {
        match self.try_save(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not save preferences: {}", e);
                false
            }
        }
    }

    /// Save preferences, replacing the whole file
    pub fn try_save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        std::fs::write(path, self.render()).map_err(write_error)?;
        tracing::debug!("Saved preferences to {:?}", path);
        Ok(())
    }

    /// Render the preference file
    pub fn render(&self) -> String {
        let mut lines = vec![
            "# ollama-scout connection preferences".to_string(),
            "# LAST_IP is updated automatically after every successful discovery.".to_string(),
            "# Set FORCE_IP to try one host before all others.".to_string(),
            String::new(),
            "# Last host that answered".to_string(),
            format!("{}={}", ConfigKey::LastIp, self.get(ConfigKey::LastIp)),
            String::new(),
            "# Preferred host".to_string(),
        ];

        match &self.forced_host {
            Some(host) => lines.push(format!("{}={}", ConfigKey::ForceIp, host)),
            None => lines.push(format!("# {}=192.168.1.100", ConfigKey::ForceIp)),
        }

        lines.extend([
            String::new(),
            "# Hosts to try next (space-separated)".to_string(),
            format!("{}={}", ConfigKey::CommonIps, self.get(ConfigKey::CommonIps)),
            String::new(),
            format!("# Port (default: {})", DEFAULT_PORT),
            format!("{}={}", ConfigKey::Port, self.port),
        ]);

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }

    /// Return a copy with `host` as the last known host
    pub fn with_last_known(mut self, host: impl Into<String>) -> Self {
        self.last_known_host = Some(host.into());
        self
    }

    /// Get a value in file form
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::LastIp => self.last_known_host.clone().unwrap_or_default(),
            ConfigKey::ForceIp => self.forced_host.clone().unwrap_or_default(),
            ConfigKey::CommonIps => self.common_hosts.join(" "),
            ConfigKey::Port => self.port.to_string(),
        }
    }

    /// Set a value from file form
    ///
    /// An empty value clears `LAST_IP`, `FORCE_IP` and `COMMON_IPS`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let host = || (!value.is_empty()).then(|| value.to_string());

        match key {
            ConfigKey::LastIp => self.last_known_host = host(),
            ConfigKey::ForceIp => self.forced_host = host(),
            ConfigKey::CommonIps => {
                self.common_hosts = value.split_whitespace().map(String::from).collect();
            }
            ConfigKey::Port => {
                self.port = value
                    .parse::<u16>()
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
            }
        }

        Ok(())
    }

    /// Reset a value to its default
    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::LastIp => self.last_known_host = None,
            ConfigKey::ForceIp => self.forced_host = None,
            ConfigKey::CommonIps => self.common_hosts = default_common_hosts(),
            ConfigKey::Port => self.port = DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.forced_host, None);
        assert_eq!(config.last_known_host, None);
        assert_eq!(config.common_hosts, vec!["localhost", "127.0.0.1"]);
        assert_eq!(config.port, 11434);
    }

    #[test]
    fn test_parse_full_file() {
        let config = ConnectionConfig::parse(
            "# comment\n\
             \n\
             LAST_IP=192.168.1.115\n\
             FORCE_IP = 10.0.0.5 \n\
             COMMON_IPS=localhost  192.168.1.2\n\
             PORT=8080\n",
        );
        assert_eq!(config.last_known_host.as_deref(), Some("192.168.1.115"));
        assert_eq!(config.forced_host.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.common_hosts, vec!["localhost", "192.168.1.2"]);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_parse_backfills_missing_keys() {
        let config = ConnectionConfig::parse("LAST_IP=10.0.0.9\n");
        assert_eq!(config.last_known_host.as_deref(), Some("10.0.0.9"));
        assert_eq!(config.common_hosts, vec!["localhost", "127.0.0.1"]);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_parse_empty_values() {
        let config = ConnectionConfig::parse("LAST_IP=\nFORCE_IP=\nCOMMON_IPS=\n");
        assert_eq!(config.last_known_host, None);
        assert_eq!(config.forced_host, None);
        assert!(config.common_hosts.is_empty());
    }

    #[test]
    fn test_parse_ignores_noise() {
        let config = ConnectionConfig::parse(
            "garbage line\nUNKNOWN=1\n# FORCE_IP=192.168.1.100\nPORT=not-a-port\n",
        );
        assert_eq!(config, ConnectionConfig::default());
    }

    #[test]
    fn test_parse_rejects_port_zero() {
        let config = ConnectionConfig::parse("PORT=0\n");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_render_commented_force_placeholder() {
        let rendered = ConnectionConfig::default().render();
        assert!(rendered.contains("# FORCE_IP=192.168.1.100"));
        assert!(rendered.contains("LAST_IP=\n"));
        assert!(rendered.contains("COMMON_IPS=localhost 127.0.0.1"));
        assert!(rendered.contains("PORT=11434"));
    }

    #[test]
    fn test_render_parses_back() {
        let config = ConnectionConfig {
            forced_host: Some("10.0.0.5".to_string()),
            last_known_host: Some("10.0.0.9".to_string()),
            common_hosts: vec!["a.local".to_string(), "b.local".to_string()],
            port: 12000,
        };
        assert_eq!(ConnectionConfig::parse(&config.render()), config);
    }

    #[test]
    fn test_with_last_known() {
        let config = ConnectionConfig::default().with_last_known("localhost");
        assert_eq!(config.last_known_host.as_deref(), Some("localhost"));
        assert_eq!(config.common_hosts, ConnectionConfig::default().common_hosts);
    }

    #[test]
    fn test_set_and_unset() {
        let mut config = ConnectionConfig::default();
        config.set(ConfigKey::ForceIp, "10.1.1.1").unwrap();
        config.set(ConfigKey::CommonIps, "x y").unwrap();
        config.set(ConfigKey::Port, "9000").unwrap();
        assert_eq!(config.get(ConfigKey::ForceIp), "10.1.1.1");
        assert_eq!(config.get(ConfigKey::CommonIps), "x y");
        assert!(config.set(ConfigKey::Port, "70000").is_err());
        assert_eq!(config.port, 9000);

        config.unset(ConfigKey::ForceIp);
        config.unset(ConfigKey::CommonIps);
        config.unset(ConfigKey::Port);
        assert_eq!(config, ConnectionConfig::default());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConnectionConfig::load(&dir.path().join("missing.conf"));
        assert_eq!(config, ConnectionConfig::default());
    }

    #[test]
    fn test_load_unreadable_path_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file
        assert!(ConnectionConfig::try_load(dir.path()).is_err());
        assert_eq!(ConnectionConfig::load(dir.path()), ConnectionConfig::default());
    }

    #[test]
    fn test_load_keeps_valid_lines_around_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut content = b"FORCE_IP=10.0.0.7\n# caf".to_vec();
        content.extend_from_slice(&[0xff, 0xfe]);
        content.extend_from_slice(b"\nCOMMON_IPS=10.0.0.8 10.0.0.9\n");
        std::fs::write(&path, content).unwrap();

        let config = ConnectionConfig::load(&path);
        assert_eq!(config.forced_host.as_deref(), Some("10.0.0.7"));
        assert_eq!(config.common_hosts, vec!["10.0.0.8", "10.0.0.9"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = ConnectionConfig::default().with_last_known("192.168.1.115");

        assert!(config.save(&path));
        assert_eq!(ConnectionConfig::load(&path), config);
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // Writing to a directory path fails
        assert!(!ConnectionConfig::default().save(dir.path()));
    }
}
