#[cfg(feature = "dns-over-https")]
pub mod https;
pub mod udp;

use async_trait::async_trait;
use hostres_domain::StageError;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// One query/response exchange with a single server.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Returns the raw wire-format response to `query`, or a classified
    /// stage error. `timeout` bounds the whole exchange.
    async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, StageError>;

    fn protocol(&self) -> &'static str;
}

pub enum Transport {
    Udp(udp::UdpTransport),
    #[cfg(feature = "dns-over-https")]
    Https(https::HttpsTransport),
}

impl Transport {
    pub fn udp(server: SocketAddr) -> Self {
        Self::Udp(udp::UdpTransport::new(server))
    }

    /// Fails with `Unavailable` when built without `dns-over-https`.
    pub fn https(url: &str) -> Result<Self, StageError> {
        #[cfg(feature = "dns-over-https")]
        {
            Ok(Self::Https(https::HttpsTransport::new(url)))
        }
        #[cfg(not(feature = "dns-over-https"))]
        {
            Err(StageError::unavailable(format!(
                "built without DNS-over-HTTPS, cannot use {url}"
            )))
        }
    }

    fn inner(&self) -> &dyn DnsTransport {
        match self {
            Self::Udp(t) => t,
            #[cfg(feature = "dns-over-https")]
            Self::Https(t) => t,
        }
    }

    pub async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, StageError> {
        self.inner().exchange(query, timeout).await
    }

    pub fn protocol(&self) -> &'static str {
        self.inner().protocol()
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp(t) => write!(f, "udp://{}", t.server_addr()),
            #[cfg(feature = "dns-over-https")]
            Self::Https(t) => f.write_str(t.url()),
        }
    }
}
