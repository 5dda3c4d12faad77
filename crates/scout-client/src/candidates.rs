//! Candidate host generation
//!
//! Produces the ordered list of addresses one discovery pass tries:
//! the forced host, the last known host, the common hosts, then a fixed
//! set of conventional addresses on the local /24 followed by the local
//! address itself. The list is deduplicated by address, keeping the
//! first (highest priority) occurrence.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use scout_core::{CandidateHost, CandidateOrigin, ConnectionConfig};

/// Host suffixes tried on the local /24, in order
pub const SWEEP_SUFFIXES: [u8; 13] = [1, 2, 5, 10, 11, 50, 100, 101, 110, 111, 115, 150, 200];

/// Public address used only to select an outbound route; nothing is sent
const ROUTE_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Source of the machine's outward-facing IPv4 address
pub trait LocalAddress: Send + Sync {
    fn local_ipv4(&self) -> Option<Ipv4Addr>;
}

/// Finds the local address by connecting a UDP socket
///
/// Connecting a datagram socket only selects a route; no packet leaves
/// the machine.
#[derive(Debug, Clone)]
pub struct RouteLookup {
    target: SocketAddr,
}

impl RouteLookup {
    pub fn new() -> Self {
        Self {
            target: ROUTE_PROBE_TARGET,
        }
    }
}

impl Default for RouteLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAddress for RouteLookup {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
        socket.connect(self.target).ok()?;
        match socket.local_addr().ok()?.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
            _ => None,
        }
    }
}

/// A fixed answer, for hosts without a route or for tests
impl LocalAddress for Option<Ipv4Addr> {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        *self
    }
}

/// Builds the candidate list for a discovery pass
pub struct CandidateGenerator {
    local: Box<dyn LocalAddress>,
}

impl CandidateGenerator {
    /// Generator that looks up the local address through the routing table
    pub fn new() -> Self {
        Self::with_local_address(RouteLookup::new())
    }

    /// Generator with a custom local address source
    pub fn with_local_address(local: impl LocalAddress + 'static) -> Self {
        Self {
            local: Box::new(local),
        }
    }

    /// Generate the ordered, deduplicated candidate list
    pub fn generate(&self, config: &ConnectionConfig) -> Vec<CandidateHost> {
        let mut list = CandidateList::default();

        if let Some(host) = &config.forced_host {
            list.push(host, CandidateOrigin::Forced);
        }
        if let Some(host) = &config.last_known_host {
            list.push(host, CandidateOrigin::LastKnown);
        }
        for host in &config.common_hosts {
            list.push(host, CandidateOrigin::Common);
        }

        match self.local.local_ipv4() {
            Some(local_ip) => {
                tracing::debug!("Local address {}, sweeping its /24", local_ip);
                for host in subnet_sweep(local_ip) {
                    list.push(&host, CandidateOrigin::SubnetSweep);
                }
            }
            None => tracing::debug!("Local address unknown, skipping subnet sweep"),
        }

        list.into_inner()
    }
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Conventional server addresses on the /24 of `local_ip`, then `local_ip`
pub fn subnet_sweep(local_ip: Ipv4Addr) -> Vec<String> {
    let [a, b, c, _] = local_ip.octets();

    SWEEP_SUFFIXES
        .iter()
        .map(|suffix| Ipv4Addr::new(a, b, c, *suffix))
        .filter(|ip| *ip != local_ip)
        .chain(std::iter::once(local_ip))
        .map(|ip| ip.to_string())
        .collect()
}

#[derive(Default)]
struct CandidateList {
    seen: HashSet<String>,
    candidates: Vec<CandidateHost>,
}

impl CandidateList {
    fn push(&mut self, address: &str, origin: CandidateOrigin) {
        let address = address.trim();
        if address.is_empty() || !self.seen.insert(address.to_string()) {
            return;
        }
        self.candidates.push(CandidateHost::new(address, origin));
    }

    fn into_inner(self) -> Vec<CandidateHost> {
        self.candidates
    }
}
