use super::{DnsQueryType, SecureDnsPolicy};
use std::fmt;
use std::str::FromStr;

/// Request priority. Ordering is significant: `Highest` is admitted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RequestPriority {
    Throttled,
    Idle,
    Lowest,
    #[default]
    Low,
    Medium,
    Highest,
}

impl RequestPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Throttled => "throttled",
            Self::Idle => "idle",
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Highest => "highest",
        }
    }
}

impl fmt::Display for RequestPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "throttled" => Ok(Self::Throttled),
            "idle" => Ok(Self::Idle),
            "lowest" => Ok(Self::Lowest),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "highest" => Ok(Self::Highest),
            other => Err(format!("Unknown priority: {other}")),
        }
    }
}

/// How a request may use the host cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheUsage {
    /// Fresh cache entries may be returned.
    #[default]
    Allowed,
    /// Stale cache entries may be returned too.
    StaleAllowed,
    /// The cache is never read. Results are still written.
    Disallowed,
}

impl CacheUsage {
    pub fn allows_read(&self) -> bool {
        !matches!(self, Self::Disallowed)
    }

    pub fn allows_stale(&self) -> bool {
        matches!(self, Self::StaleAllowed)
    }
}

/// Which sources a request is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostResolverSource {
    /// Let the policy engine decide.
    #[default]
    Any,
    System,
    Dns,
    MulticastDns,
    /// Cache, hosts and other local sources only; never creates a job.
    LocalOnly,
}

impl FromStr for HostResolverSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "system" => Ok(Self::System),
            "dns" => Ok(Self::Dns),
            "mdns" | "multicast_dns" => Ok(Self::MulticastDns),
            "local" | "local_only" => Ok(Self::LocalOnly),
            other => Err(format!("Unknown source: {other}")),
        }
    }
}

/// Caller-supplied parameters of one resolve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveParameters {
    pub query_type: DnsQueryType,
    pub priority: RequestPriority,
    pub cache_usage: CacheUsage,
    pub secure_dns_policy: SecureDnsPolicy,
    pub source: HostResolverSource,
}

impl ResolveParameters {
    pub fn with_query_type(mut self, query_type: DnsQueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn with_priority(mut self, priority: RequestPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_cache_usage(mut self, cache_usage: CacheUsage) -> Self {
        self.cache_usage = cache_usage;
        self
    }

    pub fn with_secure_dns_policy(mut self, policy: SecureDnsPolicy) -> Self {
        self.secure_dns_policy = policy;
        self
    }

    pub fn with_source(mut self, source: HostResolverSource) -> Self {
        self.source = source;
        self
    }
}
