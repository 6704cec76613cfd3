//! DNS protocol adapters: wire messages, transports, the stub client,
//! system configuration and multicast DNS.
pub mod client;
pub mod config_source;
pub mod mdns;
pub mod message;
pub mod transport;

pub use client::StubDnsClient;
pub use config_source::{parse_resolv_conf, ResolvConf, ResolvConfSource};
pub use mdns::MdnsClient;
pub use transport::{DnsTransport, Transport};
