use super::{HostResolverSource, Hostname, QueryTypeSet, SecureDnsMode};
use std::fmt;

/// Identity of a registered resolve context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl ContextId {
    /// Context registered by every manager at startup.
    pub const DEFAULT: Self = Self(0);
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Network a manager is bound to. `DEFAULT` is the system default network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NetworkHandle(pub u64);

impl NetworkHandle {
    pub const DEFAULT: Self = Self(0);
}

/// Deduplication identity of a resolution job. Immutable once a job exists
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub host: Hostname,
    pub query_types: QueryTypeSet,
    /// Effective mode after reconciling the request policy with the manager.
    pub secure_dns_mode: SecureDnsMode,
    pub source: HostResolverSource,
    pub context: ContextId,
    pub network: NetworkHandle,
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} mode={} {}",
            self.host, self.query_types, self.secure_dns_mode, self.context
        )
    }
}
