use hostres_domain::{HostEntry, ResolutionKey, ResolveError, Stage, Staleness};
use std::fmt;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Identifies one collaborator call. A fresh id is used for every leg
/// launch, so late completions of canceled runs are recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageRunId(pub(crate) u64);

impl fmt::Display for StageRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Collaborator call backing one network stage leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageTask {
    System,
    Dns { secure: bool },
    MulticastDns,
}

impl StageTask {
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Dns { secure: true })
    }

    pub fn is_insecure_dns(&self) -> bool {
        matches!(self, Self::Dns { secure: false })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLaunch {
    pub run: StageRunId,
    pub key: ResolutionKey,
    pub stage: Stage,
    pub task: StageTask,
}

/// Side effects requested by the core. The core never performs I/O; its
/// driver executes these and reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Launch(StageLaunch),
    /// Abandon a launched run. Its completion, if any, is ignored.
    Cancel(StageRunId),
    /// Refresh the IPv6 reachability probe.
    ProbeIpv6,
    /// Re-read the global DNS configuration and reload the hosts source.
    RefreshConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    NetworkChange,
    DnsConfigChange,
}

impl InvalidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkChange => "network_change",
            Self::DnsConfigChange => "dns_config_change",
        }
    }
}

/// Terminal callback payload, delivered exactly once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub result: Result<HostEntry, ResolveError>,
    /// Staleness of a cache entry that was found but not used.
    pub stale_info: Option<Staleness>,
}

pub type CompletionSender = oneshot::Sender<Completion>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoreStats {
    pub num_jobs: usize,
    pub num_running_stages: usize,
    pub num_queued_stages: usize,
    pub num_contexts: usize,
}
