use async_trait::async_trait;

#[async_trait]
pub trait ReachabilityProber: Send + Sync {
    /// True when a global IPv6 destination appears routable.
    async fn probe_ipv6(&self) -> bool;
}
