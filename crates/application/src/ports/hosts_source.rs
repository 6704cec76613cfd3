use hostres_domain::{DomainError, HostEntry, Hostname, QueryTypeSet};

/// Static name table, usually `/etc/hosts`. Lookups are synchronous.
pub trait HostsSource: Send + Sync {
    /// Returns the addresses of `host` filtered to `query_types`, or `None`
    /// when the host is unknown or has no address of a requested family.
    fn lookup(&self, host: &Hostname, query_types: QueryTypeSet) -> Option<HostEntry>;

    fn reload(&self) -> Result<(), DomainError>;
}
