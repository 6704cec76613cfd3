//! hostres domain layer
pub mod config;
pub mod errors;
pub mod host_entry;
pub mod hostname;
pub mod query_type;
pub mod request;
pub mod resolution_key;
pub mod secure_dns;
pub mod stage;

pub use config::{CliOverrides, Config, ConfigError};
pub use errors::{AbortReason, DomainError, ResolveError, StageError, StageErrorKind};
pub use host_entry::{CachedData, EntrySource, HostEntry, Staleness};
pub use hostname::Hostname;
pub use query_type::{DnsQueryType, QueryTypeSet};
pub use request::{CacheUsage, HostResolverSource, RequestPriority, ResolveParameters};
pub use resolution_key::{ContextId, NetworkHandle, ResolutionKey};
pub use secure_dns::{SecureDnsMode, SecureDnsPolicy};
pub use stage::{Security, Stage};
