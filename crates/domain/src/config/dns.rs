use serde::{Deserialize, Serialize};
use std::time::Duration;

/// DNS client, hosts file and resolv.conf settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Plain DNS nameservers ("ip" or "ip:port"). Empty = read `resolv_conf`.
    #[serde(default)]
    pub nameservers: Vec<String>,

    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: String,

    /// DNS-over-HTTPS endpoints used by secure stages.
    #[serde(default = "default_doh_servers")]
    pub doh_servers: Vec<String>,

    #[serde(default = "default_hosts_file")]
    pub hosts_file: String,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Attempts per nameserver before moving on.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

impl DnsConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            resolv_conf: default_resolv_conf(),
            doh_servers: default_doh_servers(),
            hosts_file: default_hosts_file(),
            query_timeout_ms: default_query_timeout_ms(),
            attempts: default_attempts(),
        }
    }
}

fn default_resolv_conf() -> String {
    "/etc/resolv.conf".to_string()
}

fn default_doh_servers() -> Vec<String> {
    vec!["https://1.1.1.1/dns-query".to_string()]
}

fn default_hosts_file() -> String {
    "/etc/hosts".to_string()
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_attempts() -> u32 {
    2
}
