use super::{ConfigPresets, StageSequence};
use crate::ports::{CacheKey, HostCache, HostsSource};
use hostres_domain::host_entry::filter_addresses;
use hostres_domain::{
    CacheUsage, CachedData, EntrySource, HostEntry, ResolutionKey, Stage, Staleness,
};
use std::time::Instant;

/// Result of one local lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalResult {
    Hit(HostEntry),
    /// Cached "name does not exist".
    NegativeHit,
    Miss,
}

/// Outcome of the fast path: the local result plus the stages still to run.
#[derive(Debug)]
pub struct FastPath {
    pub result: LocalResult,
    pub remaining: StageSequence,
    /// Staleness of a cache entry that was found but not served.
    pub stale_info: Option<Staleness>,
}

/// Synchronous sources consulted before any job exists, and by jobs for
/// local stages that sit between network stages.
pub struct LocalResolver<'a> {
    pub cache: Option<&'a dyn HostCache>,
    pub hosts: &'a dyn HostsSource,
    pub presets: &'a ConfigPresets,
}

impl<'a> LocalResolver<'a> {
    /// Tries, in order: IP literal, leading cache stages, a leading hosts
    /// stage, localhost names, a leading config-preset stage. Consumed
    /// stages are removed whether they hit or not.
    pub fn try_local(
        &self,
        key: &ResolutionKey,
        cache_usage: CacheUsage,
        mut stages: StageSequence,
        now: Instant,
    ) -> FastPath {
        let mut stale_info = None;

        if let Some(ip) = key.host.ip_literal() {
            stages.clear();
            let addresses = filter_addresses(&[ip], key.query_types);
            let result = if addresses.is_empty() {
                LocalResult::NegativeHit
            } else {
                LocalResult::Hit(HostEntry::new(addresses, EntrySource::IpLiteral))
            };
            return FastPath {
                result,
                remaining: stages,
                stale_info,
            };
        }

        while stages.first().is_some_and(Stage::is_cache_lookup) {
            let stage = stages.remove(0);
            let allow_stale = cache_usage.allows_stale();
            let result = self.run_stage(stage, key, allow_stale, now, &mut stale_info);
            if result != LocalResult::Miss {
                return FastPath {
                    result,
                    remaining: stages,
                    stale_info,
                };
            }
        }

        if stages.first() == Some(&Stage::Hosts) {
            let stage = stages.remove(0);
            let result = self.run_stage(stage, key, false, now, &mut stale_info);
            if let hit @ LocalResult::Hit(_) = result {
                return FastPath {
                    result: hit,
                    remaining: stages,
                    stale_info,
                };
            }
        }

        if key.host.is_localhost() && key.query_types.has_address_type() {
            return FastPath {
                result: LocalResult::Hit(HostEntry::localhost(key.query_types)),
                remaining: stages,
                stale_info,
            };
        }

        if stages.first() == Some(&Stage::ConfigPreset) {
            let stage = stages.remove(0);
            let result = self.run_stage(stage, key, false, now, &mut stale_info);
            if let hit @ LocalResult::Hit(_) = result {
                return FastPath {
                    result: hit,
                    remaining: stages,
                    stale_info,
                };
            }
        }

        FastPath {
            result: LocalResult::Miss,
            remaining: stages,
            stale_info,
        }
    }

    /// Runs a single local stage. Network stages always miss.
    pub fn run_stage(
        &self,
        stage: Stage,
        key: &ResolutionKey,
        allow_stale: bool,
        now: Instant,
        stale_info: &mut Option<Staleness>,
    ) -> LocalResult {
        match stage {
            Stage::IpLiteral => key
                .host
                .ip_literal()
                .map(|ip| filter_addresses(&[ip], key.query_types))
                .filter(|addresses| !addresses.is_empty())
                .map_or(LocalResult::NegativeHit, |addresses| {
                    LocalResult::Hit(HostEntry::new(addresses, EntrySource::IpLiteral))
                }),
            Stage::CacheLookup(security) => {
                let Some(cache) = self.cache else {
                    return LocalResult::Miss;
                };
                let cache_key = CacheKey::new(
                    key.host.clone(),
                    key.query_types,
                    key.network,
                    security.is_secure(),
                );
                let Some((data, staleness)) = cache.lookup(&cache_key, now) else {
                    return LocalResult::Miss;
                };
                if staleness.is_stale() {
                    *stale_info = Some(staleness);
                    if !allow_stale {
                        return LocalResult::Miss;
                    }
                }
                match data {
                    CachedData::Addresses(entry) => {
                        LocalResult::Hit(entry.from_source(EntrySource::Cache))
                    }
                    CachedData::NegativeResponse => LocalResult::NegativeHit,
                }
            }
            Stage::Hosts => self
                .hosts
                .lookup(&key.host, key.query_types)
                .filter(|entry| !entry.is_empty())
                .map_or(LocalResult::Miss, LocalResult::Hit),
            Stage::ConfigPreset => self
                .presets
                .lookup(&key.host, key.query_types)
                .map_or(LocalResult::Miss, LocalResult::Hit),
            Stage::System | Stage::DnsClient(_) | Stage::DnsRace | Stage::MulticastDns => {
                LocalResult::Miss
            }
        }
    }
}
