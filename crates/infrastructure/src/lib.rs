//! Collaborator adapters and the manager task that drives the resolver core.
pub mod cache;
pub mod dns;
pub mod events;
pub mod hosts;
pub mod resolver;
pub mod system;

pub use cache::InMemoryHostCache;
pub use dns::{DnsTransport, MdnsClient, ResolvConfSource, StubDnsClient, Transport};
pub use events::ChangeNotifier;
pub use hosts::HostsFile;
pub use resolver::{HostResolver, HostResolverBuilder, ManagerStats, ResolveRequest};
pub use system::{TokioSystemResolver, UdpReachabilityProber};
