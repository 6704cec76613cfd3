pub mod dns_client;
pub mod dns_config_source;
pub mod host_cache;
pub mod hosts_source;
pub mod mdns_source;
pub mod reachability;
pub mod system_resolver;

pub use dns_client::{DnsClient, DnsClientConfig};
pub use dns_config_source::DnsConfigSource;
pub use host_cache::{CacheKey, HostCache};
pub use hosts_source::HostsSource;
pub use mdns_source::MdnsSource;
pub use reachability::ReachabilityProber;
pub use system_resolver::SystemResolver;
