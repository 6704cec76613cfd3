use std::fmt;
use thiserror::Error;

/// Input and validation errors. Returned synchronously, never through a
/// completion channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Hostname cannot be empty")]
    EmptyHostname,

    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    #[error("Hostname exceeds 253 characters: {0}")]
    HostnameTooLong(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

/// Classification of a single stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageErrorKind {
    /// Authoritative "no such name". Never retried.
    NameNotResolved,
    Timeout,
    ServerFailure,
    Network,
    MalformedResponse,
    /// The collaborator for this stage is not configured or not usable.
    Unavailable,
    /// The stage was interrupted by a network or DNS configuration change.
    NetworkChanged,
}

impl StageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameNotResolved => "name_not_resolved",
            Self::Timeout => "timeout",
            Self::ServerFailure => "server_failure",
            Self::Network => "network",
            Self::MalformedResponse => "malformed_response",
            Self::Unavailable => "unavailable",
            Self::NetworkChanged => "network_changed",
        }
    }
}

impl fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a stage collaborator. The detail string carries the
/// underlying cause for diagnostics and is not interpreted further.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct StageError {
    pub kind: StageErrorKind,
    pub detail: String,
}

impl StageError {
    pub fn new(kind: StageErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn name_not_resolved(host: &str) -> Self {
        Self::new(StageErrorKind::NameNotResolved, format!("{host} does not exist"))
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(StageErrorKind::Timeout, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(StageErrorKind::Unavailable, detail)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind != StageErrorKind::NameNotResolved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    ContextShutDown,
    NetworkChanged,
    ManagerShutDown,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ContextShutDown => "resolve context shut down",
            Self::NetworkChanged => "network changed",
            Self::ManagerShutDown => "resolver manager shut down",
        })
    }
}

/// Terminal outcome of a request, delivered exactly once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Name not resolved: {host}")]
    NameNotResolved { host: String },

    #[error("Not found in local sources")]
    CacheMiss,

    #[error("Request aborted: {0}")]
    Aborted(AbortReason),

    #[error("Resolver queue too large")]
    QueueTooLarge,

    #[error("Resolution failed: {0}")]
    StageFailed(StageError),
}

impl ResolveError {
    pub fn name_not_resolved(host: &str) -> Self {
        Self::NameNotResolved {
            host: host.to_string(),
        }
    }

    /// Maps the last stage failure of a job onto a terminal error.
    pub fn from_stage(host: &str, error: StageError) -> Self {
        match error.kind {
            StageErrorKind::NameNotResolved => Self::name_not_resolved(host),
            StageErrorKind::NetworkChanged => Self::Aborted(AbortReason::NetworkChanged),
            _ => Self::StageFailed(error),
        }
    }
}
