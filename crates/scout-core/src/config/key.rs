//! Recognised preference file keys

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A key of the `KEY=VALUE` preference file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Last host that answered a probe
    LastIp,
    /// Host tried before every other tier
    ForceIp,
    /// Space-separated hosts tried after the last known host
    CommonIps,
    /// Service port
    Port,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::LastIp,
        ConfigKey::ForceIp,
        ConfigKey::CommonIps,
        ConfigKey::Port,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::LastIp => "LAST_IP",
            ConfigKey::ForceIp => "FORCE_IP",
            ConfigKey::CommonIps => "COMMON_IPS",
            ConfigKey::Port => "PORT",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    /// Keys are matched case-insensitively, so `force_ip` works on the
    /// command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }
}
