use super::QueryTypeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

pub static EMPTY_ALIASES: LazyLock<Arc<[Arc<str>]>> = LazyLock::new(|| Arc::from([]));

/// Where a resolved entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntrySource {
    IpLiteral,
    Cache,
    Hosts,
    Localhost,
    ConfigPreset,
    System,
    Dns,
    SecureDns,
    MulticastDns,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpLiteral => "ip_literal",
            Self::Cache => "cache",
            Self::Hosts => "hosts",
            Self::Localhost => "localhost",
            Self::ConfigPreset => "config_preset",
            Self::System => "system",
            Self::Dns => "dns",
            Self::SecureDns => "secure_dns",
            Self::MulticastDns => "mdns",
        }
    }

    /// Only results fetched from the network are written back to the cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Self::System | Self::Dns | Self::SecureDns | Self::MulticastDns
        )
    }
}

/// A successful resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub addresses: Arc<Vec<IpAddr>>,
    /// Canonical name and aliases, in resolution order.
    pub aliases: Arc<[Arc<str>]>,
    pub source: EntrySource,
    /// TTL supplied by the stage. `None` means "do not cache".
    pub ttl: Option<Duration>,
}

impl HostEntry {
    pub fn new(addresses: Vec<IpAddr>, source: EntrySource) -> Self {
        Self {
            addresses: Arc::new(addresses),
            aliases: Arc::clone(&EMPTY_ALIASES),
            source,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<Arc<str>>) -> Self {
        self.aliases = Arc::from(aliases);
        self
    }

    /// Same addresses, reported as coming from `source`.
    pub fn from_source(&self, source: EntrySource) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    /// Keeps only the address families present in `query_types`.
    pub fn filtered(&self, query_types: QueryTypeSet) -> Self {
        let addresses = filter_addresses(&self.addresses, query_types);
        Self {
            addresses: Arc::new(addresses),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Loopback answer for `localhost` and its aliases.
    pub fn localhost(query_types: QueryTypeSet) -> Self {
        let addresses = vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ];
        Self::new(filter_addresses(&addresses, query_types), EntrySource::Localhost)
    }
}

pub fn filter_addresses(addresses: &[IpAddr], query_types: QueryTypeSet) -> Vec<IpAddr> {
    use super::DnsQueryType;

    addresses
        .iter()
        .copied()
        .filter(|ip| match ip {
            IpAddr::V4(_) => query_types.contains(DnsQueryType::A),
            IpAddr::V6(_) => query_types.contains(DnsQueryType::AAAA),
        })
        .collect()
}

/// Staleness metadata of a cache hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Staleness {
    /// How long ago the entry expired, if it has.
    pub expired_by: Option<Duration>,
    /// Network changes observed since the entry was stored.
    pub network_changes: u32,
    /// Times this entry was returned while stale.
    pub stale_hits: u32,
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        self.expired_by.is_some() || self.network_changes > 0
    }
}

/// Data stored in a host cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedData {
    Addresses(HostEntry),
    /// The name authoritatively does not exist.
    NegativeResponse,
}

impl CachedData {
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::NegativeResponse)
    }

    pub fn as_entry(&self) -> Option<&HostEntry> {
        match self {
            Self::Addresses(entry) => Some(entry),
            Self::NegativeResponse => None,
        }
    }
}
