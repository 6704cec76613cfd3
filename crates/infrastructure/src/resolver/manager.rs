//! Manager task.
//!
//! Owns the [`ResolverCore`] and is the only code that touches it. Callers
//! talk to it over an unbounded command channel; collaborator calls run as
//! spawned tasks that report back on an internal event channel. Effects
//! emitted by the core are executed after every step.

use hostres_application::ports::{
    DnsClient, DnsClientConfig, DnsConfigSource, HostCache, HostsSource, MdnsSource,
    ReachabilityProber, SystemResolver,
};
use hostres_application::scheduler::{
    CompletionSender, CoreStats, Effect, InvalidationReason, RequestId, ResolverCore,
    StageLaunch, StageRunId, StageTask,
};
use hostres_application::services::DnsSettings;
use hostres_domain::{
    ContextId, DomainError, HostEntry, Hostname, QueryTypeSet, ResolveParameters, StageError,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Snapshot of manager activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagerStats {
    pub num_jobs: usize,
    pub num_running_stages: usize,
    pub num_queued_stages: usize,
    pub num_contexts: usize,
    /// Collaborator calls currently in flight.
    pub num_tasks: usize,
}

impl ManagerStats {
    fn new(core: CoreStats, num_tasks: usize) -> Self {
        Self {
            num_jobs: core.num_jobs,
            num_running_stages: core.num_running_stages,
            num_queued_stages: core.num_queued_stages,
            num_contexts: core.num_contexts,
            num_tasks,
        }
    }
}

pub(crate) enum Command {
    Resolve {
        host: Hostname,
        params: ResolveParameters,
        context: ContextId,
        reply: CompletionSender,
        /// Dropped unsent when the request completes locally.
        id_tx: oneshot::Sender<RequestId>,
    },
    /// Sent after the matching `Resolve`, so the id (if any) is already
    /// in the channel when this is handled.
    Cancel(oneshot::Receiver<RequestId>),
    RegisterContext {
        cache: Option<Arc<dyn HostCache>>,
        reply: oneshot::Sender<ContextId>,
    },
    DeregisterContext(ContextId),
    Invalidate(InvalidationReason),
    UpdateSettings(DnsSettings),
    SetInsecureDnsEnabled(bool),
    SetLimits {
        max_concurrent_stages: usize,
        max_queued_stages: usize,
    },
    Stats(oneshot::Sender<ManagerStats>),
}

enum Event {
    Stage {
        run: StageRunId,
        task: StageTask,
        result: Result<HostEntry, StageError>,
    },
    Ipv6(bool),
    Config(Result<DnsClientConfig, DomainError>),
}

impl Event {
    fn is_secure_success(&self) -> bool {
        matches!(self, Self::Stage { task, result: Ok(_), .. } if task.is_secure())
    }
}

enum Step {
    Command(Command),
    Events(Vec<Event>),
    Change(InvalidationReason),
    Stop,
}

/// Collaborators the manager calls on behalf of the core.
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub system: Arc<dyn SystemResolver>,
    pub dns: Arc<dyn DnsClient>,
    pub mdns: Arc<dyn MdnsSource>,
    pub prober: Arc<dyn ReachabilityProber>,
    pub hosts: Arc<dyn HostsSource>,
    pub config_source: Arc<dyn DnsConfigSource>,
}

impl Collaborators {
    async fn run_stage(
        &self,
        task: StageTask,
        host: &Hostname,
        query_types: QueryTypeSet,
    ) -> Result<HostEntry, StageError> {
        match task {
            StageTask::System => self.system.resolve(host, query_types).await,
            StageTask::Dns { secure } => self.dns.query(host, query_types, secure).await,
            StageTask::MulticastDns => self.mdns.query(host, query_types).await,
        }
    }

    fn refresh_config(&self) -> Result<DnsClientConfig, DomainError> {
        if let Err(e) = self.hosts.reload() {
            warn!(error = %e, "Hosts source reload failed, keeping previous table");
        }
        self.config_source.read()
    }
}

pub(crate) struct Manager {
    core: ResolverCore,
    collaborators: Collaborators,
    stage_timeout: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    changes: Option<broadcast::Receiver<InvalidationReason>>,
    shutdown: CancellationToken,
    running: FxHashMap<StageRunId, AbortHandle>,
}

impl Manager {
    pub(crate) fn new(
        core: ResolverCore,
        collaborators: Collaborators,
        stage_timeout: Duration,
        commands: mpsc::UnboundedReceiver<Command>,
        changes: Option<broadcast::Receiver<InvalidationReason>>,
        shutdown: CancellationToken,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            core,
            collaborators,
            stage_timeout,
            commands,
            events_tx,
            events_rx,
            changes,
            shutdown,
            running: FxHashMap::default(),
        }
    }

    pub(crate) async fn run(mut self) {
        info!(
            mode = %self.core.settings().secure_dns_mode,
            max_concurrent_stages = self.core.options().max_concurrent_stages,
            dns_config = self.core.dns_config_available(),
            "Resolver manager started"
        );

        loop {
            let step = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Step::Stop,
                Some(event) = self.events_rx.recv() => Step::Events(vec![event]),
                command = self.commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Stop,
                },
                Some(reason) = next_change(&mut self.changes) => Step::Change(reason),
            };

            match step {
                Step::Command(command) => self.handle_command(command),
                Step::Events(mut batch) => {
                    while let Ok(event) = self.events_rx.try_recv() {
                        batch.push(event);
                    }
                    // Secure results that finished together with insecure
                    // siblings are applied first.
                    batch.sort_by_key(|event| !event.is_secure_success());
                    for event in batch {
                        self.handle_event(event);
                    }
                }
                Step::Change(reason) => self.core.invalidate_caches(reason, Instant::now()),
                Step::Stop => break,
            }

            self.execute_effects();
        }

        self.core.shutdown();
        self.core.take_effects();
        for (_, handle) in self.running.drain() {
            handle.abort();
        }
        info!("Resolver manager stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let now = Instant::now();
        match command {
            Command::Resolve {
                host,
                params,
                context,
                reply,
                id_tx,
            } => {
                if let Some(id) = self.core.resolve(host, params, context, reply, now) {
                    let _ = id_tx.send(id);
                }
            }
            Command::Cancel(mut id_rx) => {
                if let Ok(id) = id_rx.try_recv() {
                    debug!(request_id = %id, "Request dropped by caller");
                    self.core.cancel_request(id);
                }
            }
            Command::RegisterContext { cache, reply } => {
                let id = self.core.register_context(cache);
                let _ = reply.send(id);
            }
            Command::DeregisterContext(context) => self.core.deregister_context(context),
            Command::Invalidate(reason) => self.core.invalidate_caches(reason, now),
            Command::UpdateSettings(settings) => self.core.update_settings(settings, now),
            Command::SetInsecureDnsEnabled(enabled) => {
                self.core.set_insecure_dns_enabled(enabled, now)
            }
            Command::SetLimits {
                max_concurrent_stages,
                max_queued_stages,
            } => self.core.set_limits(max_concurrent_stages, max_queued_stages),
            Command::Stats(reply) => {
                let _ = reply.send(ManagerStats::new(self.core.stats(), self.running.len()));
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        let now = Instant::now();
        match event {
            Event::Stage { run, result, .. } => {
                self.running.remove(&run);
                self.core.on_stage_complete(run, result, now);
            }
            Event::Ipv6(reachable) => self.core.on_ipv6_probed(reachable, now),
            Event::Config(Ok(config)) => {
                let usable = config.is_usable();
                self.collaborators.dns.set_config(Some(config));
                self.core.apply_dns_config(usable);
            }
            Event::Config(Err(e)) => {
                warn!(error = %e, "Failed to read DNS configuration");
                self.collaborators.dns.set_config(None);
                self.core.apply_dns_config(false);
            }
        }
    }

    fn execute_effects(&mut self) {
        for effect in self.core.take_effects() {
            match effect {
                Effect::Launch(launch) => self.launch(launch),
                Effect::Cancel(run) => {
                    if let Some(handle) = self.running.remove(&run) {
                        handle.abort();
                    }
                }
                Effect::ProbeIpv6 => {
                    let prober = Arc::clone(&self.collaborators.prober);
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let reachable = prober.probe_ipv6().await;
                        let _ = events.send(Event::Ipv6(reachable));
                    });
                }
                Effect::RefreshConfig => {
                    let collaborators = self.collaborators.clone();
                    let events = self.events_tx.clone();
                    tokio::task::spawn_blocking(move || {
                        let _ = events.send(Event::Config(collaborators.refresh_config()));
                    });
                }
            }
        }
    }

    fn launch(&mut self, launch: StageLaunch) {
        let StageLaunch {
            run,
            key,
            stage,
            task,
        } = launch;
        let collaborators = self.collaborators.clone();
        let events = self.events_tx.clone();
        let timeout = self.stage_timeout;

        debug!(host = %key.host, stage = %stage, run = %run, "Launching stage");
        let handle = tokio::spawn(async move {
            let call = collaborators.run_stage(task, &key.host, key.query_types);
            let result = match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(StageError::timeout(format!(
                    "{stage} for {} exceeded {timeout:?}",
                    key.host
                ))),
            };
            let _ = events.send(Event::Stage { run, task, result });
        });
        self.running.insert(run, handle.abort_handle());
    }
}

/// Next change notification. Yields `None` (disabling the branch) once the
/// notifier is gone.
async fn next_change(
    changes: &mut Option<broadcast::Receiver<InvalidationReason>>,
) -> Option<InvalidationReason> {
    let receiver = changes.as_mut()?;
    match receiver.recv().await {
        Ok(reason) => Some(reason),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            warn!(skipped, "Missed change notifications, invalidating");
            Some(InvalidationReason::NetworkChange)
        }
        Err(broadcast::error::RecvError::Closed) => {
            *changes = None;
            None
        }
    }
}
