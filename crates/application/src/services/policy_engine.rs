//! Stage-sequence construction.
//!
//! Everything here is a pure function of the request and a [`ManagerState`]
//! snapshot, so identical concurrent requests always collapse onto the same
//! [`ResolutionKey`] and the same plan.

use super::ConfigPresets;
use hostres_domain::config::ResolverConfig;
use hostres_domain::{
    CacheUsage, ContextId, DnsQueryType, HostResolverSource, Hostname, NetworkHandle,
    QueryTypeSet, ResolutionKey, ResolveParameters, SecureDnsMode, Security, Stage,
};
use smallvec::SmallVec;

pub type StageSequence = SmallVec<[Stage; 6]>;

/// Manager-wide DNS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsSettings {
    pub secure_dns_mode: SecureDnsMode,
    pub insecure_dns_enabled: bool,
    pub fallback_to_system: bool,
    pub race_secure_and_insecure: bool,
    pub prioritize_local_lookups_on_stale: bool,
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            secure_dns_mode: SecureDnsMode::Automatic,
            insecure_dns_enabled: true,
            fallback_to_system: true,
            race_secure_and_insecure: false,
            prioritize_local_lookups_on_stale: true,
        }
    }
}

impl DnsSettings {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            secure_dns_mode: config.secure_dns_mode,
            insecure_dns_enabled: config.insecure_dns_enabled,
            fallback_to_system: config.fallback_to_system,
            race_secure_and_insecure: config.race_secure_and_insecure,
            prioritize_local_lookups_on_stale: config.prioritize_local_lookups_on_stale,
        }
    }
}

/// Snapshot of everything stage construction depends on.
#[derive(Debug, Clone, Copy)]
pub struct ManagerState<'a> {
    pub settings: DnsSettings,
    /// A DNS-client configuration is loaded.
    pub dns_config_available: bool,
    /// Last IPv6 reachability probe result.
    pub ipv6_reachable: bool,
    pub presets: &'a ConfigPresets,
}

/// Narrows an unspecified query to IPv4 when IPv6 looks unreachable.
pub fn effective_query_types(
    host: &Hostname,
    query_type: DnsQueryType,
    ipv6_reachable: bool,
) -> QueryTypeSet {
    if query_type == DnsQueryType::Unspecified && !ipv6_reachable && !host.is_ip_literal() {
        return QueryTypeSet::single(DnsQueryType::A);
    }
    query_type.to_set()
}

pub fn resolution_key(
    host: Hostname,
    params: &ResolveParameters,
    context: ContextId,
    network: NetworkHandle,
    state: &ManagerState<'_>,
) -> ResolutionKey {
    let query_types = effective_query_types(&host, params.query_type, state.ipv6_reachable);
    ResolutionKey {
        secure_dns_mode: params
            .secure_dns_policy
            .effective_mode(state.settings.secure_dns_mode),
        host,
        query_types,
        source: params.source,
        context,
        network,
    }
}

/// Stale-tolerant requests pull local lookups ahead of secure network stages.
pub fn prioritize_local_lookups(cache_usage: CacheUsage, settings: &DnsSettings) -> bool {
    cache_usage.allows_stale() && settings.prioritize_local_lookups_on_stale
}

/// Whether a failed DNS-client stage may be replaced by the system resolver.
pub fn allows_system_fallback(key: &ResolutionKey, settings: &DnsSettings) -> bool {
    settings.fallback_to_system
        && key.secure_dns_mode != SecureDnsMode::Secure
        && key.source == HostResolverSource::Any
        && key.query_types.has_address_type()
}

pub fn build_stage_sequence(
    key: &ResolutionKey,
    cache_usage: CacheUsage,
    state: &ManagerState<'_>,
) -> StageSequence {
    let mut stages = StageSequence::new();

    if key.host.is_ip_literal() {
        stages.push(Stage::IpLiteral);
        return stages;
    }

    let multicast = match key.source {
        HostResolverSource::MulticastDns => true,
        HostResolverSource::Any => key.host.is_multicast_dns(),
        _ => false,
    };
    if multicast {
        stages.push(Stage::MulticastDns);
        return stages;
    }

    let mode = key.secure_dns_mode;
    let network = network_stages(key, state);
    let has_secure_network = network
        .iter()
        .any(|s| matches!(s, Stage::DnsClient(Security::Secure) | Stage::DnsRace));
    let cache_allowed = cache_usage.allows_read();
    let prioritize = prioritize_local_lookups(cache_usage, &state.settings);
    let deferred_insecure_cache = cache_allowed
        && !prioritize
        && has_secure_network
        && mode == SecureDnsMode::Automatic;

    if cache_allowed {
        match mode {
            SecureDnsMode::Off => stages.push(Stage::CacheLookup(Security::Insecure)),
            SecureDnsMode::Secure => stages.push(Stage::CacheLookup(Security::Secure)),
            SecureDnsMode::Automatic => {
                stages.push(Stage::CacheLookup(Security::Secure));
                if !deferred_insecure_cache {
                    stages.push(Stage::CacheLookup(Security::Insecure));
                }
            }
        }
    }

    if state.dns_config_available && mode != SecureDnsMode::Secure {
        stages.push(Stage::Hosts);
    }

    if state.presets.contains(&key.host) {
        stages.push(Stage::ConfigPreset);
    }

    for stage in network {
        if deferred_insecure_cache && stage == Stage::DnsRace {
            stages.push(Stage::CacheLookup(Security::Insecure));
        }
        stages.push(stage);
        if deferred_insecure_cache && stage == Stage::DnsClient(Security::Secure) {
            stages.push(Stage::CacheLookup(Security::Insecure));
        }
    }

    stages
}

fn network_stages(key: &ResolutionKey, state: &ManagerState<'_>) -> SmallVec<[Stage; 2]> {
    let settings = &state.settings;
    let address = key.query_types.has_address_type();
    let mut stages = SmallVec::new();

    match key.source {
        HostResolverSource::LocalOnly | HostResolverSource::MulticastDns => {}
        HostResolverSource::System => {
            if key.secure_dns_mode != SecureDnsMode::Secure && address {
                stages.push(Stage::System);
            }
        }
        HostResolverSource::Any | HostResolverSource::Dns => {
            let system_allowed = key.source == HostResolverSource::Any && address;
            match key.secure_dns_mode {
                SecureDnsMode::Secure => stages.push(Stage::DnsClient(Security::Secure)),
                _ if key.source == HostResolverSource::Any && !state.dns_config_available => {
                    if system_allowed {
                        stages.push(Stage::System);
                    }
                }
                SecureDnsMode::Off => {
                    if settings.insecure_dns_enabled {
                        stages.push(Stage::DnsClient(Security::Insecure));
                    } else if system_allowed {
                        stages.push(Stage::System);
                    }
                }
                SecureDnsMode::Automatic => {
                    if settings.race_secure_and_insecure && settings.insecure_dns_enabled {
                        stages.push(Stage::DnsRace);
                    } else {
                        stages.push(Stage::DnsClient(Security::Secure));
                        if settings.insecure_dns_enabled {
                            stages.push(Stage::DnsClient(Security::Insecure));
                        } else if system_allowed && settings.fallback_to_system {
                            stages.push(Stage::System);
                        }
                    }
                }
            }
        }
    }

    stages
}
