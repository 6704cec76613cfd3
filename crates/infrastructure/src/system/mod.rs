use async_trait::async_trait;
use hostres_application::ports::{ReachabilityProber, SystemResolver};
use hostres_domain::host_entry::filter_addresses;
use hostres_domain::{EntrySource, HostEntry, Hostname, QueryTypeSet, StageError};
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// System resolver stage backed by the platform's `getaddrinfo`.
///
/// Only address lookups are supported. The platform does not report TTLs,
/// so results carry none and the core applies its own system TTL.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSystemResolver;

impl TokioSystemResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SystemResolver for TokioSystemResolver {
    async fn resolve(
        &self,
        host: &Hostname,
        query_types: QueryTypeSet,
    ) -> Result<HostEntry, StageError> {
        if !query_types.has_address_type() {
            return Err(StageError::unavailable(format!(
                "system resolver cannot answer {query_types:?}"
            )));
        }

        let resolved = tokio::net::lookup_host((host.as_str(), 0)).await.map_err(|e| {
            debug!(host = %host, error = %e, "System lookup failed");
            StageError::name_not_resolved(host.as_str())
        })?;

        let mut addresses: Vec<IpAddr> = Vec::new();
        for addr in resolved {
            let ip = addr.ip();
            if !addresses.contains(&ip) {
                addresses.push(ip);
            }
        }

        let addresses = filter_addresses(&addresses, query_types);
        if addresses.is_empty() {
            return Err(StageError::name_not_resolved(host.as_str()));
        }

        Ok(HostEntry::new(addresses, EntrySource::System))
    }
}

/// Well-known global IPv6 destination used for the reachability check.
const IPV6_PROBE_TARGET: SocketAddr = SocketAddr::new(
    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)),
    53,
);

/// Checks IPv6 reachability by connecting a UDP socket to a global address.
/// No packet is sent; a successful connect means the kernel has a route.
#[derive(Debug, Clone, Copy)]
pub struct UdpReachabilityProber {
    target: SocketAddr,
}

impl Default for UdpReachabilityProber {
    fn default() -> Self {
        Self {
            target: IPV6_PROBE_TARGET,
        }
    }
}

impl UdpReachabilityProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(target: SocketAddr) -> Self {
        Self { target }
    }
}

#[async_trait]
impl ReachabilityProber for UdpReachabilityProber {
    async fn probe_ipv6(&self) -> bool {
        let socket = match UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0)).await {
            Ok(socket) => socket,
            Err(e) => {
                debug!(error = %e, "IPv6 socket unavailable");
                return false;
            }
        };

        match socket.connect(self.target).await {
            Ok(()) => true,
            Err(e) => {
                debug!(target = %self.target, error = %e, "IPv6 destination unreachable");
                false
            }
        }
    }
}
