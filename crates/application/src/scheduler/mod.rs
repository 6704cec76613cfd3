pub mod dispatcher;
pub mod effects;
pub mod job;
pub mod registry;

pub use dispatcher::{AddOutcome, PrioritizedDispatcher, Ticket};
pub use effects::{
    Completion, CompletionSender, CoreStats, Effect, InvalidationReason, RequestId,
    StageLaunch, StageRunId, StageTask,
};
pub use job::{ActiveStage, FailureAction, Job, JobId, JobState, Leg, LegState};
pub use registry::{CoreOptions, ResolverCore};
