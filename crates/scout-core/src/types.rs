//! Core domain types

use std::fmt;

/// Which tier of discovery produced a candidate
///
/// Variants are declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateOrigin {
    /// `FORCE_IP` from the preference file
    Forced,
    /// Last host that answered
    LastKnown,
    /// Entry of `COMMON_IPS`
    Common,
    /// Conventional address on the local /24
    SubnetSweep,
}

impl fmt::Display for CandidateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateOrigin::Forced => write!(f, "forced"),
            CandidateOrigin::LastKnown => write!(f, "last known"),
            CandidateOrigin::Common => write!(f, "common"),
            CandidateOrigin::SubnetSweep => write!(f, "subnet sweep"),
        }
    }
}

/// An address considered during one discovery pass
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateHost {
    pub address: String,
    pub origin: CandidateOrigin,
}

impl CandidateHost {
    pub fn new(address: impl Into<String>, origin: CandidateOrigin) -> Self {
        Self {
            address: address.into(),
            origin,
        }
    }
}

/// An established binding to one reachable host/port pair
///
/// Only discovery creates these; a reconnect replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSession {
    host: String,
    port: u16,
}

impl ServerSession {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL of the server, e.g. `http://192.168.1.10:11434`
    pub fn base_url(&self) -> String {
        base_url(&self.host, self.port)
    }
}

impl fmt::Display for ServerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

/// Build an `http://host:port` URL, bracketing IPv6 literals
pub fn base_url(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{}]:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}
