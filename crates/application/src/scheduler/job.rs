use super::dispatcher::Ticket;
use super::effects::{Completion, CompletionSender, RequestId, StageRunId, StageTask};
use crate::services::StageSequence;
use hostres_domain::{
    CacheUsage, HostEntry, RequestPriority, ResolutionKey, ResolveError, Security, Stage,
    StageError, StageErrorKind, Staleness,
};
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created; the first network stage has not been granted a slot yet.
    Pending,
    Running(Stage),
    Succeeded,
    Failed,
    /// Terminal. The job has left the registry.
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegState {
    Queued(Ticket),
    Running(StageRunId),
    Failed(StageError),
}

/// One slot-holding part of a network stage. A race stage has two.
#[derive(Debug, Clone)]
pub struct Leg {
    pub task: StageTask,
    pub state: LegState,
}

impl Leg {
    pub fn is_pending(&self) -> bool {
        !matches!(self.state, LegState::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct ActiveStage {
    pub stage: Stage,
    pub legs: SmallVec<[Leg; 2]>,
}

impl ActiveStage {
    /// Error reported for the whole stage once every leg has failed.
    /// "No such name" wins over transport errors, then the secure leg's cause.
    pub fn combined_error(&self) -> StageError {
        let failures = || {
            self.legs.iter().filter_map(|leg| match &leg.state {
                LegState::Failed(error) => Some((leg.task, error)),
                _ => None,
            })
        };
        failures()
            .find(|(_, e)| e.kind == StageErrorKind::NameNotResolved)
            .or_else(|| failures().find(|(task, _)| task.is_secure()))
            .or_else(|| failures().next())
            .map(|(_, e)| e.clone())
            .unwrap_or_else(|| {
                StageError::unavailable(format!("{} produced no result", self.stage))
            })
    }

    /// Legs that reported "no such name".
    pub fn negative_tasks(&self) -> SmallVec<[StageTask; 2]> {
        self.legs
            .iter()
            .filter(|leg| {
                matches!(&leg.state, LegState::Failed(e) if e.kind == StageErrorKind::NameNotResolved)
            })
            .map(|leg| leg.task)
            .collect()
    }
}

/// Collaborator calls needed to run `stage`.
pub fn tasks_for(stage: Stage) -> SmallVec<[StageTask; 2]> {
    let mut tasks = SmallVec::new();
    match stage {
        Stage::System => tasks.push(StageTask::System),
        Stage::DnsClient(security) => tasks.push(StageTask::Dns {
            secure: security.is_secure(),
        }),
        Stage::DnsRace => {
            tasks.push(StageTask::Dns { secure: true });
            tasks.push(StageTask::Dns { secure: false });
        }
        Stage::MulticastDns => tasks.push(StageTask::MulticastDns),
        Stage::IpLiteral | Stage::CacheLookup(_) | Stage::Hosts | Stage::ConfigPreset => {}
    }
    tasks
}

/// Next step after a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    Continue,
    Terminal,
}

pub struct AttachedRequest {
    pub id: RequestId,
    pub priority: RequestPriority,
    stale_info: Option<Staleness>,
    reply: CompletionSender,
}

impl AttachedRequest {
    pub fn new(
        id: RequestId,
        priority: RequestPriority,
        stale_info: Option<Staleness>,
        reply: CompletionSender,
    ) -> Self {
        Self {
            id,
            priority,
            stale_info,
            reply,
        }
    }

    pub fn complete(self, result: Result<HostEntry, ResolveError>) {
        // The caller may already be gone.
        let _ = self.reply.send(Completion {
            result,
            stale_info: self.stale_info,
        });
    }
}

impl fmt::Debug for AttachedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedRequest")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Deduplicated execution of one stage sequence for one key.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    key: ResolutionKey,
    stages: StageSequence,
    state: JobState,
    active: Option<ActiveStage>,
    requests: SmallVec<[AttachedRequest; 1]>,
    priority: RequestPriority,
    allow_stale: bool,
    last_error: Option<StageError>,
}

impl Job {
    pub fn new(id: JobId, key: ResolutionKey, stages: StageSequence, allow_stale: bool) -> Self {
        Self {
            id,
            key,
            stages,
            state: JobState::Pending,
            active: None,
            requests: SmallVec::new(),
            priority: RequestPriority::Throttled,
            allow_stale,
            last_error: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn key(&self) -> &ResolutionKey {
        &self.key
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn priority(&self) -> RequestPriority {
        self.priority
    }

    pub fn allow_stale(&self) -> bool {
        self.allow_stale
    }

    pub fn remaining_stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn active(&self) -> Option<&ActiveStage> {
        self.active.as_ref()
    }

    pub fn num_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Attaches a request. Returns true when the job's priority rose.
    pub fn attach(&mut self, request: AttachedRequest, cache_usage: CacheUsage) -> bool {
        if !cache_usage.allows_read() {
            self.stages.retain(|stage| !stage.is_cache_lookup());
        }
        self.allow_stale &= cache_usage.allows_stale();

        let raised = self.requests.is_empty() || request.priority > self.priority;
        if raised {
            self.priority = request.priority;
        }
        self.requests.push(request);
        raised
    }

    /// Detaches a request. Returns true when the job's priority changed.
    /// An orphaned job keeps its last priority.
    pub fn detach(&mut self, id: RequestId) -> bool {
        let Some(position) = self.requests.iter().position(|r| r.id == id) else {
            return false;
        };
        self.requests.remove(position);

        let Some(highest) = self.requests.iter().map(|r| r.priority).max() else {
            return false;
        };
        let changed = highest != self.priority;
        self.priority = highest;
        changed
    }

    pub fn take_requests(&mut self) -> SmallVec<[AttachedRequest; 1]> {
        std::mem::take(&mut self.requests)
    }

    pub fn next_stage(&mut self) -> Option<Stage> {
        if self.stages.is_empty() {
            None
        } else {
            Some(self.stages.remove(0))
        }
    }

    pub fn begin_stage(&mut self, stage: Stage) {
        self.active = Some(ActiveStage {
            stage,
            legs: SmallVec::new(),
        });
        if self.state != JobState::Pending {
            self.state = JobState::Running(stage);
        }
    }

    pub fn push_leg(&mut self, task: StageTask, state: LegState) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if matches!(state, LegState::Running(_)) {
            self.state = JobState::Running(active.stage);
        }
        active.legs.push(Leg { task, state });
    }

    /// Moves a queued leg to running once the dispatcher admits it.
    pub fn start_leg(
        &mut self,
        leg: usize,
        ticket: Ticket,
        run: StageRunId,
    ) -> Option<(Stage, StageTask)> {
        let active = self.active.as_mut()?;
        let slot = active.legs.get_mut(leg)?;
        if slot.state != LegState::Queued(ticket) {
            return None;
        }
        slot.state = LegState::Running(run);
        self.state = JobState::Running(active.stage);
        Some((active.stage, slot.task))
    }

    /// Identifies the leg a completion belongs to.
    pub fn leg_for_run(&self, run: StageRunId) -> Option<(usize, Stage, StageTask)> {
        let active = self.active.as_ref()?;
        active
            .legs
            .iter()
            .position(|leg| leg.state == LegState::Running(run))
            .map(|index| (index, active.stage, active.legs[index].task))
    }

    pub fn fail_leg(&mut self, leg: usize, error: StageError) {
        if let Some(slot) = self.active.as_mut().and_then(|a| a.legs.get_mut(leg)) {
            slot.state = LegState::Failed(error);
        }
    }

    /// Marks running legs matching `filter` as failed and returns their runs.
    pub fn fail_running_legs(
        &mut self,
        filter: impl Fn(StageTask) -> bool,
        error: &StageError,
    ) -> SmallVec<[StageRunId; 2]> {
        let mut aborted = SmallVec::new();
        let Some(active) = self.active.as_mut() else {
            return aborted;
        };
        for leg in active.legs.iter_mut() {
            if let LegState::Running(run) = leg.state {
                if filter(leg.task) {
                    aborted.push(run);
                    leg.state = LegState::Failed(error.clone());
                }
            }
        }
        aborted
    }

    pub fn has_running_leg(&self, filter: impl Fn(StageTask) -> bool) -> bool {
        self.active.as_ref().is_some_and(|active| {
            active
                .legs
                .iter()
                .any(|leg| matches!(leg.state, LegState::Running(_)) && filter(leg.task))
        })
    }

    /// True while some leg of the current stage may still produce a result.
    pub fn has_pending_legs(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.legs.iter().any(Leg::is_pending))
    }

    pub fn queued_tickets(&self) -> SmallVec<[Ticket; 2]> {
        self.active
            .iter()
            .flat_map(|active| active.legs.iter())
            .filter_map(|leg| match leg.state {
                LegState::Queued(ticket) => Some(ticket),
                _ => None,
            })
            .collect()
    }

    pub fn take_active(&mut self) -> Option<ActiveStage> {
        self.active.take()
    }

    pub fn set_last_error(&mut self, error: StageError) {
        self.last_error = Some(error);
    }

    pub fn take_last_error(&mut self) -> Option<StageError> {
        self.last_error.take()
    }

    /// Applies the fallback rules to a failed stage.
    pub fn apply_failure(
        &mut self,
        failed: Stage,
        error: &StageError,
        allow_system_fallback: bool,
    ) -> FailureAction {
        if !error.is_retryable() {
            return FailureAction::Terminal;
        }

        let insecure_dns = matches!(
            failed,
            Stage::DnsClient(Security::Insecure) | Stage::DnsRace
        );
        if insecure_dns && allow_system_fallback {
            self.stages.retain(|stage| {
                !matches!(
                    stage,
                    Stage::DnsClient(Security::Insecure) | Stage::DnsRace | Stage::CacheLookup(_)
                )
            });
            if !self.stages.contains(&Stage::System) {
                self.stages.insert(0, Stage::System);
            }
            return FailureAction::Continue;
        }

        if !self.stages.is_empty() {
            return FailureAction::Continue;
        }

        if failed == Stage::DnsClient(Security::Secure) && allow_system_fallback {
            self.stages.push(Stage::System);
            return FailureAction::Continue;
        }

        FailureAction::Terminal
    }

    pub fn finish(&mut self, succeeded: bool) {
        self.active = None;
        self.state = if succeeded {
            JobState::Succeeded
        } else {
            JobState::Failed
        };
    }

    pub fn mark_completed(&mut self) {
        self.state = JobState::Completed;
    }
}
