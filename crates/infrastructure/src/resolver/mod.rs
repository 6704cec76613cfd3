//! Asynchronous front end of the resolver core.
mod builder;
mod handle;
mod manager;

pub use builder::HostResolverBuilder;
pub use handle::{HostResolver, ResolveRequest};
pub use manager::ManagerStats;
