use super::DnsTransport;
use async_trait::async_trait;
use hostres_domain::{StageError, StageErrorKind};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const DNS_MESSAGE: &str = "application/dns-message";

static CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .use_rustls_tls()
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// RFC 8484 POST exchange against one DoH endpoint.
pub struct HttpsTransport {
    url: String,
}

impl HttpsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, query: &[u8]) -> Result<Vec<u8>, StageError> {
        let network_error =
            |e: reqwest::Error| StageError::new(StageErrorKind::Network, format!("{}: {e}", self.url));

        let response = CLIENT
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, DNS_MESSAGE)
            .header(reqwest::header::ACCEPT, DNS_MESSAGE)
            .body(query.to_vec())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::new(
                StageErrorKind::ServerFailure,
                format!("{} returned HTTP {status}", self.url),
            ));
        }

        let body = response.bytes().await.map_err(network_error)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, StageError> {
        let body = tokio::time::timeout(timeout, self.post(query))
            .await
            .map_err(|_| StageError::timeout(format!("{} did not answer in {timeout:?}", self.url)))??;

        debug!(url = %self.url, len = body.len(), "DoH answer");
        Ok(body)
    }

    fn protocol(&self) -> &'static str {
        "https"
    }
}
