use super::message::{build_query, parse_response, DnsAnswer};
use super::transport::Transport;
use async_trait::async_trait;
use futures::future::join_all;
use hostres_application::ports::MdnsSource;
use hostres_domain::{
    DnsQueryType, EntrySource, HostEntry, Hostname, QueryTypeSet, StageError,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::debug;

/// IPv4 mDNS group (RFC 6762 §3)
pub const MDNS_IPV4_GROUP: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(224, 0, 0, 251)), 5353);

const DEFAULT_MDNS_TIMEOUT: Duration = Duration::from_millis(1000);

/// Multicast DNS stage using legacy unicast queries (RFC 6762 §6.7).
///
/// Queries leave from an ephemeral port, so responders answer directly to
/// the sender with the query id echoed.
pub struct MdnsClient {
    target: SocketAddr,
    timeout: Duration,
}

impl Default for MdnsClient {
    fn default() -> Self {
        Self::new(MDNS_IPV4_GROUP, DEFAULT_MDNS_TIMEOUT)
    }
}

impl MdnsClient {
    pub fn new(target: SocketAddr, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    async fn query_type(
        &self,
        host: &Hostname,
        query_type: DnsQueryType,
    ) -> Result<DnsAnswer, StageError> {
        let (_, query) = build_query(host.as_str(), query_type)?;
        let response = Transport::udp(self.target)
            .exchange(&query, self.timeout)
            .await?;
        parse_response(&response)
    }
}

#[async_trait]
impl MdnsSource for MdnsClient {
    async fn query(
        &self,
        host: &Hostname,
        query_types: QueryTypeSet,
    ) -> Result<HostEntry, StageError> {
        if !query_types.has_address_type() {
            return Err(StageError::unavailable(format!(
                "mDNS only resolves addresses, not {query_types:?}"
            )));
        }

        let types: Vec<DnsQueryType> = query_types
            .iter()
            .filter(|t| matches!(t, DnsQueryType::A | DnsQueryType::AAAA))
            .collect();
        let results = join_all(types.iter().map(|t| self.query_type(host, *t))).await;

        let mut addresses = Vec::new();
        let mut ttl: Option<Duration> = None;
        let mut last_error = None;
        for result in results {
            match result {
                Ok(answer) => {
                    addresses.extend(answer.addresses);
                    if let Some(answer_ttl) = answer.min_ttl {
                        ttl = Some(ttl.map_or(answer_ttl, |current| current.min(answer_ttl)));
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        if addresses.is_empty() {
            debug!(host = %host, error = ?last_error, "mDNS query found nothing");
            return Err(match last_error {
                Some(e) if e.is_retryable() => e,
                _ => StageError::name_not_resolved(host.as_str()),
            });
        }

        let entry = HostEntry::new(addresses, EntrySource::MulticastDns);
        Ok(match ttl {
            Some(ttl) => entry.with_ttl(ttl),
            None => entry,
        })
    }
}
