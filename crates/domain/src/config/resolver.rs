use crate::SecureDnsMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

/// Scheduler and policy settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub secure_dns_mode: SecureDnsMode,

    #[serde(default = "default_true")]
    pub insecure_dns_enabled: bool,

    /// Fall back to the system resolver when DNS-client stages fail.
    #[serde(default = "default_true")]
    pub fallback_to_system: bool,

    /// Automatic mode only: race secure and insecure DNS queries.
    #[serde(default)]
    pub race_secure_and_insecure: bool,

    /// Stale-allowed requests skip the secure-only cache and check the
    /// insecure cache up front.
    #[serde(default = "default_true")]
    pub prioritize_local_lookups_on_stale: bool,

    #[serde(default = "default_max_concurrent_stages")]
    pub max_concurrent_stages: usize,

    /// 0 = unbounded queue
    #[serde(default)]
    pub max_queued_stages: usize,

    /// Abort a job as soon as its last request detaches.
    #[serde(default)]
    pub cancel_orphaned_jobs: bool,

    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,

    #[serde(default = "default_ipv6_probe_freshness_ms")]
    pub ipv6_probe_freshness_ms: u64,

    #[serde(default = "default_negative_ttl_secs")]
    pub negative_ttl_secs: u64,

    #[serde(default = "default_system_result_ttl_secs")]
    pub system_result_ttl_secs: u64,

    /// Static host overrides served by the config-preset stage.
    #[serde(default)]
    pub presets: BTreeMap<String, Vec<IpAddr>>,
}

impl ResolverConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    pub fn ipv6_probe_freshness(&self) -> Duration {
        Duration::from_millis(self.ipv6_probe_freshness_ms)
    }

    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_secs)
    }

    pub fn system_result_ttl(&self) -> Duration {
        Duration::from_secs(self.system_result_ttl_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            secure_dns_mode: SecureDnsMode::default(),
            insecure_dns_enabled: true,
            fallback_to_system: true,
            race_secure_and_insecure: false,
            prioritize_local_lookups_on_stale: true,
            max_concurrent_stages: default_max_concurrent_stages(),
            max_queued_stages: 0,
            cancel_orphaned_jobs: false,
            stage_timeout_ms: default_stage_timeout_ms(),
            ipv6_probe_freshness_ms: default_ipv6_probe_freshness_ms(),
            negative_ttl_secs: default_negative_ttl_secs(),
            system_result_ttl_secs: default_system_result_ttl_secs(),
            presets: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_stages() -> usize {
    6
}

fn default_stage_timeout_ms() -> u64 {
    5000
}

fn default_ipv6_probe_freshness_ms() -> u64 {
    1000
}

fn default_negative_ttl_secs() -> u64 {
    60
}

fn default_system_result_ttl_secs() -> u64 {
    60
}
