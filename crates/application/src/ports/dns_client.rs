use async_trait::async_trait;
use hostres_domain::{HostEntry, Hostname, QueryTypeSet, StageError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Effective DNS-client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsClientConfig {
    pub nameservers: Vec<SocketAddr>,
    /// DNS-over-HTTPS endpoints (`https://` URLs).
    pub doh_servers: Vec<String>,
    pub search_domains: Vec<String>,
    pub timeout: Duration,
    pub attempts: u32,
}

impl DnsClientConfig {
    pub fn has_insecure_servers(&self) -> bool {
        !self.nameservers.is_empty()
    }

    pub fn has_secure_servers(&self) -> bool {
        !self.doh_servers.is_empty()
    }

    pub fn is_usable(&self) -> bool {
        self.has_insecure_servers() || self.has_secure_servers()
    }
}

/// Stub resolver used by DNS-client stages. May retry internally; each call
/// is one stage attempt as far as the scheduler is concerned.
#[async_trait]
pub trait DnsClient: Send + Sync {
    async fn query(
        &self,
        host: &Hostname,
        query_types: QueryTypeSet,
        secure: bool,
    ) -> Result<HostEntry, StageError>;

    fn config(&self) -> Option<Arc<DnsClientConfig>>;

    fn set_config(&self, config: Option<DnsClientConfig>);
}
