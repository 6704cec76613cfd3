use dashmap::DashMap;
use hostres_application::ports::{CacheKey, HostCache};
use hostres_domain::config::CacheConfig;
use hostres_domain::{CachedData, Staleness};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheSlot {
    data: CachedData,
    expires: Instant,
    stale_hits: AtomicU32,
}

#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub stale_hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
}

/// Bounded in-memory host cache.
///
/// Expired entries stay readable as stale until `max_stale` has passed, then
/// they are dropped on lookup. When full, a store first sweeps unusable
/// entries and then evicts the entry closest to expiry.
pub struct InMemoryHostCache {
    entries: DashMap<CacheKey, CacheSlot, FxBuildHasher>,
    max_entries: usize,
    max_stale: Duration,
    metrics: CacheMetrics,
}

impl InMemoryHostCache {
    pub fn new(max_entries: usize, max_stale: Duration) -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher(max_entries.min(1024), FxBuildHasher),
            max_entries: max_entries.max(1),
            max_stale,
            metrics: CacheMetrics::default(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.max_stale())
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn make_room(&self, now: Instant) {
        let max_stale = self.max_stale;
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| now.saturating_duration_since(slot.expires) <= max_stale);
        let mut evicted = before - self.entries.len();

        if self.entries.len() >= self.max_entries {
            let victim = self
                .entries
                .iter()
                .min_by_key(|slot| slot.expires)
                .map(|slot| slot.key().clone());
            if let Some(key) = victim {
                self.entries.remove(&key);
                evicted += 1;
            }
        }

        if evicted > 0 {
            self.metrics
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, remaining = self.entries.len(), "Host cache evicted entries");
        }
    }
}

impl HostCache for InMemoryHostCache {
    fn lookup(&self, key: &CacheKey, now: Instant) -> Option<(CachedData, Staleness)> {
        let Some(slot) = self.entries.get(key) else {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if now < slot.expires {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            return Some((slot.data.clone(), Staleness::default()));
        }

        let expired_by = now.duration_since(slot.expires);
        if expired_by > self.max_stale {
            drop(slot);
            self.entries.remove(key);
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let stale_hits = slot.stale_hits.fetch_add(1, Ordering::Relaxed) + 1;
        self.metrics.stale_hits.fetch_add(1, Ordering::Relaxed);
        let staleness = Staleness {
            expired_by: Some(expired_by),
            network_changes: 0,
            stale_hits,
        };
        Some((slot.data.clone(), staleness))
    }

    fn store(&self, key: CacheKey, data: CachedData, ttl: Duration, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }
        self.entries.insert(
            key,
            CacheSlot {
                data,
                expires: now + ttl,
                stale_hits: AtomicU32::new(0),
            },
        );
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
