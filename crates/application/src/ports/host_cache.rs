use hostres_domain::{CachedData, Hostname, NetworkHandle, QueryTypeSet, Staleness};
use std::time::{Duration, Instant};

/// Identity of a cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub host: Hostname,
    pub query_types: QueryTypeSet,
    pub network: NetworkHandle,
    /// Results fetched over secure DNS are kept apart from insecure ones.
    pub secure: bool,
}

impl CacheKey {
    pub fn new(
        host: Hostname,
        query_types: QueryTypeSet,
        network: NetworkHandle,
        secure: bool,
    ) -> Self {
        Self {
            host,
            query_types,
            network,
            secure,
        }
    }
}

/// Result cache of one resolve context.
///
/// Lookups return stale entries together with their staleness; the caller
/// decides whether a stale entry is acceptable.
pub trait HostCache: Send + Sync {
    fn lookup(&self, key: &CacheKey, now: Instant) -> Option<(CachedData, Staleness)>;

    fn store(&self, key: CacheKey, data: CachedData, ttl: Duration, now: Instant);

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
