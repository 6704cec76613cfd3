use super::DnsClientConfig;
use hostres_domain::DomainError;

/// Reads the system-wide DNS configuration (resolv.conf or equivalent).
pub trait DnsConfigSource: Send + Sync {
    fn read(&self) -> Result<DnsClientConfig, DomainError>;
}
