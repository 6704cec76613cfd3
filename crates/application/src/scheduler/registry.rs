//! Job registry.
//!
//! [`ResolverCore`] owns every job, the admission dispatcher and the
//! manager-wide state. It is driven from a single task: callers hand it
//! requests and collaborator completions, and it answers with [`Effect`]s
//! for the driver to execute. Completions go straight to each request's
//! oneshot sender, so nothing re-enters the core while it is mutating.

use super::dispatcher::{AddOutcome, PrioritizedDispatcher, Ticket};
use super::effects::{
    Completion, CompletionSender, CoreStats, Effect, InvalidationReason, RequestId,
    StageLaunch, StageRunId, StageTask,
};
use super::job::{
    tasks_for, ActiveStage, AttachedRequest, FailureAction, Job, JobId, JobState, LegState,
};
use crate::ports::{CacheKey, HostCache, HostsSource};
use crate::services::{
    allows_system_fallback, build_stage_sequence, resolution_key, ConfigPresets, DnsSettings,
    LocalResolver, LocalResult, ManagerState,
};
use hostres_domain::config::ResolverConfig;
use hostres_domain::{
    AbortReason, CachedData, ContextId, HostEntry, HostResolverSource, Hostname,
    NetworkHandle, ResolutionKey, ResolveError, ResolveParameters, SecureDnsMode, Stage,
    StageError, StageErrorKind,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Scheduler tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreOptions {
    pub max_concurrent_stages: usize,
    /// 0 = unbounded.
    pub max_queued_stages: usize,
    pub cancel_orphaned_jobs: bool,
    pub ipv6_probe_freshness: Duration,
    pub negative_ttl: Duration,
    pub system_result_ttl: Duration,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl CoreOptions {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            max_concurrent_stages: config.max_concurrent_stages,
            max_queued_stages: config.max_queued_stages,
            cancel_orphaned_jobs: config.cancel_orphaned_jobs,
            ipv6_probe_freshness: config.ipv6_probe_freshness(),
            negative_ttl: config.negative_ttl(),
            system_result_ttl: config.system_result_ttl(),
        }
    }
}

#[derive(Debug)]
struct Ipv6Probe {
    reachable: bool,
    fresh_until: Option<Instant>,
    in_flight: bool,
}

/// What a dispatcher entry or a launched run refers to.
#[derive(Debug, Clone)]
struct SlotClaim {
    key: ResolutionKey,
    job: JobId,
    leg: usize,
}

pub struct ResolverCore {
    settings: DnsSettings,
    options: CoreOptions,
    presets: Arc<ConfigPresets>,
    hosts: Arc<dyn HostsSource>,
    network: NetworkHandle,
    dns_config_available: bool,
    contexts: FxHashMap<ContextId, Arc<dyn HostCache>>,
    ipv6: Ipv6Probe,
    jobs: FxHashMap<ResolutionKey, Job>,
    requests: FxHashMap<RequestId, ResolutionKey>,
    runs: FxHashMap<StageRunId, SlotClaim>,
    dispatcher: PrioritizedDispatcher<SlotClaim>,
    effects: Vec<Effect>,
    next_job: u64,
    next_request: u64,
    next_run: u64,
    next_context: u64,
}

impl ResolverCore {
    /// Creates a core whose default context uses `cache`.
    pub fn new(
        settings: DnsSettings,
        options: CoreOptions,
        hosts: Arc<dyn HostsSource>,
        presets: Arc<ConfigPresets>,
        cache: Option<Arc<dyn HostCache>>,
    ) -> Self {
        let mut contexts: FxHashMap<ContextId, Arc<dyn HostCache>> = FxHashMap::default();
        if let Some(cache) = cache {
            contexts.insert(ContextId::DEFAULT, cache);
        }

        Self {
            settings,
            dispatcher: PrioritizedDispatcher::new(
                options.max_concurrent_stages,
                options.max_queued_stages,
            ),
            options,
            presets,
            hosts,
            network: NetworkHandle::DEFAULT,
            dns_config_available: false,
            contexts,
            ipv6: Ipv6Probe {
                reachable: true,
                fresh_until: None,
                in_flight: false,
            },
            jobs: FxHashMap::default(),
            requests: FxHashMap::default(),
            runs: FxHashMap::default(),
            effects: Vec::new(),
            next_job: 1,
            next_request: 1,
            next_run: 1,
            next_context: ContextId::DEFAULT.0 + 1,
        }
    }

    pub fn with_network(mut self, network: NetworkHandle) -> Self {
        self.network = network;
        self
    }

    pub fn settings(&self) -> DnsSettings {
        self.settings
    }

    pub fn options(&self) -> CoreOptions {
        self.options
    }

    pub fn dns_config_available(&self) -> bool {
        self.dns_config_available
    }

    /// Drains the effects accumulated since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Starts a request. Local results are sent on `reply` before this
    /// returns; otherwise the request joins a job and its id is returned.
    pub fn resolve(
        &mut self,
        host: Hostname,
        params: ResolveParameters,
        context: ContextId,
        reply: CompletionSender,
        now: Instant,
    ) -> Option<RequestId> {
        self.refresh_ipv6_probe_if_stale(now);

        let cache = self.contexts.get(&context).cloned();
        let (key, fast) = {
            let state = self.manager_state();
            let key = resolution_key(host, &params, context, self.network, &state);
            let stages = build_stage_sequence(&key, params.cache_usage, &state);
            let local = LocalResolver {
                cache: cache.as_deref(),
                hosts: self.hosts.as_ref(),
                presets: &self.presets,
            };
            let fast = local.try_local(&key, params.cache_usage, stages, now);
            (key, fast)
        };

        let immediate = match fast.result {
            LocalResult::Hit(entry) => Some(Ok(entry)),
            LocalResult::NegativeHit => {
                Some(Err(ResolveError::name_not_resolved(key.host.as_str())))
            }
            LocalResult::Miss if key.source == HostResolverSource::LocalOnly => {
                Some(Err(ResolveError::CacheMiss))
            }
            LocalResult::Miss if fast.remaining.is_empty() => {
                let error = StageError::unavailable(format!(
                    "no resolution stage available for {}",
                    key.host
                ));
                Some(Err(ResolveError::StageFailed(error)))
            }
            LocalResult::Miss => None,
        };

        if let Some(result) = immediate {
            debug!(
                host = %key.host,
                ok = result.is_ok(),
                stale = fast.stale_info.is_some(),
                "Resolved locally"
            );
            let _ = reply.send(Completion {
                result,
                stale_info: fast.stale_info,
            });
            return None;
        }

        let id = RequestId(self.next_request);
        self.next_request += 1;
        let request = AttachedRequest::new(id, params.priority, fast.stale_info, reply);
        self.requests.insert(id, key.clone());

        if let Some(job) = self.jobs.get_mut(&key) {
            let raised = job.attach(request, params.cache_usage);
            debug!(
                host = %key.host,
                job_id = %job.id(),
                request_id = %id,
                requests = job.num_requests(),
                "Request joined existing job"
            );
            if raised {
                self.reprioritize(&key);
            }
        } else {
            let job_id = JobId(self.next_job);
            self.next_job += 1;
            let mut job = Job::new(
                job_id,
                key.clone(),
                fast.remaining,
                params.cache_usage.allows_stale(),
            );
            job.attach(request, params.cache_usage);
            info!(
                host = %key.host,
                job_id = %job_id,
                request_id = %id,
                mode = %key.secure_dns_mode,
                stages = ?job.remaining_stages(),
                "Job created"
            );
            self.jobs.insert(key.clone(), job);
            self.advance_job(&key, now);
        }

        self.admit_queued();
        Some(id)
    }

    /// Detaches a request whose caller went away. No completion is sent.
    pub fn cancel_request(&mut self, id: RequestId) {
        let Some(key) = self.requests.remove(&id) else {
            return;
        };
        let Some(job) = self.jobs.get_mut(&key) else {
            return;
        };

        let lowered = job.detach(id);
        if job.has_requests() {
            if lowered {
                self.reprioritize(&key);
            }
        } else if self.options.cancel_orphaned_jobs {
            if let Some(mut job) = self.jobs.remove(&key) {
                debug!(host = %key.host, job_id = %job.id(), "Orphaned job canceled");
                self.release_active(&mut job);
                job.mark_completed();
            }
        } else {
            debug!(host = %key.host, job_id = %job.id(), "Orphaned job keeps running");
        }

        self.admit_queued();
    }

    // ------------------------------------------------------------------
    // Collaborator completions
    // ------------------------------------------------------------------

    pub fn on_stage_complete(
        &mut self,
        run: StageRunId,
        result: Result<HostEntry, StageError>,
        now: Instant,
    ) {
        let Some(claim) = self.runs.remove(&run) else {
            debug!(run = %run, "Ignoring completion of abandoned run");
            return;
        };
        self.dispatcher.release();

        let key = claim.key;
        let located = match self.jobs.get(&key) {
            Some(job) if job.id() == claim.job => job.leg_for_run(run),
            _ => None,
        };
        let Some((leg, stage, task)) = located else {
            self.admit_queued();
            return;
        };

        match result {
            Ok(entry) => {
                debug!(host = %key.host, stage = %stage, run = %run, "Stage succeeded");
                self.write_cache(&key, task, &entry, now);
                self.complete_job(&key, Ok(entry));
            }
            Err(error) => {
                if let Some(job) = self.jobs.get_mut(&key) {
                    job.fail_leg(leg, error);
                    if job.has_pending_legs() {
                        debug!(
                            host = %key.host,
                            stage = %stage,
                            "Race leg failed, waiting for sibling"
                        );
                    } else if let Some(active) = job.take_active() {
                        self.fail_stage(&key, &active, now);
                    }
                }
            }
        }

        self.admit_queued();
    }

    pub fn on_ipv6_probed(&mut self, reachable: bool, now: Instant) {
        if reachable != self.ipv6.reachable {
            info!(reachable, "IPv6 reachability changed");
        }
        self.ipv6 = Ipv6Probe {
            reachable,
            fresh_until: Some(now + self.options.ipv6_probe_freshness),
            in_flight: false,
        };
    }

    // ------------------------------------------------------------------
    // Contexts
    // ------------------------------------------------------------------

    pub fn register_context(&mut self, cache: Option<Arc<dyn HostCache>>) -> ContextId {
        let id = ContextId(self.next_context);
        self.next_context += 1;
        if let Some(cache) = cache {
            self.contexts.insert(id, cache);
        }
        debug!(context = %id, "Context registered");
        id
    }

    /// Aborts every job of `context` and forgets its cache.
    pub fn deregister_context(&mut self, context: ContextId) {
        self.contexts.remove(&context);
        let keys: Vec<ResolutionKey> = self
            .jobs
            .keys()
            .filter(|key| key.context == context)
            .cloned()
            .collect();

        info!(context = %context, aborted_jobs = keys.len(), "Context deregistered");
        for key in keys {
            self.complete_job(&key, Err(ResolveError::Aborted(AbortReason::ContextShutDown)));
        }
        self.admit_queued();
    }

    // ------------------------------------------------------------------
    // Invalidation and settings
    // ------------------------------------------------------------------

    /// Network or DNS-config change. Emits [`Effect::RefreshConfig`]; the
    /// driver answers with [`Self::apply_dns_config`].
    pub fn invalidate_caches(&mut self, reason: InvalidationReason, now: Instant) {
        info!(
            reason = reason.as_str(),
            jobs = self.jobs.len(),
            contexts = self.contexts.len(),
            "Invalidating caches"
        );

        self.ipv6.fresh_until = None;
        self.ipv6.in_flight = false;
        for cache in self.contexts.values() {
            cache.clear();
        }

        let error = StageError::new(StageErrorKind::NetworkChanged, reason.as_str());
        self.abort_running_legs(
            |task| matches!(task, StageTask::System | StageTask::Dns { secure: false }),
            &error,
            now,
        );

        self.effects.push(Effect::RefreshConfig);
        self.admit_queued();
    }

    /// Records the refreshed DNS configuration and completes jobs that the
    /// hosts source can now answer.
    pub fn apply_dns_config(&mut self, available: bool) {
        self.dns_config_available = available;
        if available {
            self.serve_jobs_from_hosts();
        }
        self.admit_queued();
    }

    pub fn set_insecure_dns_enabled(&mut self, enabled: bool, now: Instant) {
        let was_enabled = self.settings.insecure_dns_enabled;
        self.settings.insecure_dns_enabled = enabled;
        if was_enabled && !enabled {
            info!("Insecure DNS disabled, aborting insecure DNS stages");
            let error = StageError::unavailable("insecure DNS client disabled");
            self.abort_running_legs(|task: StageTask| task.is_insecure_dns(), &error, now);
        }
        self.admit_queued();
    }

    /// Replaces the DNS policy. Running jobs keep their plan.
    pub fn update_settings(&mut self, settings: DnsSettings, now: Instant) {
        let insecure_enabled = settings.insecure_dns_enabled;
        self.settings = DnsSettings {
            insecure_dns_enabled: self.settings.insecure_dns_enabled,
            ..settings
        };
        self.set_insecure_dns_enabled(insecure_enabled, now);
    }

    pub fn set_limits(&mut self, max_concurrent_stages: usize, max_queued_stages: usize) {
        self.options.max_concurrent_stages = max_concurrent_stages;
        self.options.max_queued_stages = max_queued_stages;
        let evicted = self
            .dispatcher
            .set_limits(max_concurrent_stages, max_queued_stages);
        for (ticket, claim) in evicted {
            self.evict(ticket, claim);
        }
        self.admit_queued();
    }

    /// Aborts every job. Used when the driver stops.
    pub fn shutdown(&mut self) {
        let keys: Vec<ResolutionKey> = self.jobs.keys().cloned().collect();
        for key in keys {
            self.complete_job(&key, Err(ResolveError::Aborted(AbortReason::ManagerShutDown)));
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn num_running_stages(&self) -> usize {
        self.dispatcher.num_running()
    }

    pub fn num_queued_stages(&self) -> usize {
        self.dispatcher.num_queued()
    }

    pub fn stats(&self) -> CoreStats {
        CoreStats {
            num_jobs: self.num_jobs(),
            num_running_stages: self.num_running_stages(),
            num_queued_stages: self.num_queued_stages(),
            num_contexts: self.contexts.len(),
        }
    }

    pub fn job(&self, key: &ResolutionKey) -> Option<&Job> {
        self.jobs.get(key)
    }

    pub fn job_state(&self, key: &ResolutionKey) -> Option<JobState> {
        self.jobs.get(key).map(Job::state)
    }

    pub fn request_key(&self, id: RequestId) -> Option<&ResolutionKey> {
        self.requests.get(&id)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn manager_state(&self) -> ManagerState<'_> {
        ManagerState {
            settings: self.settings,
            dns_config_available: self.dns_config_available,
            ipv6_reachable: self.ipv6.reachable,
            presets: &self.presets,
        }
    }

    fn refresh_ipv6_probe_if_stale(&mut self, now: Instant) {
        let stale = self.ipv6.fresh_until.map_or(true, |until| now >= until);
        if stale && !self.ipv6.in_flight {
            self.ipv6.in_flight = true;
            self.effects.push(Effect::ProbeIpv6);
        }
    }

    /// Runs local stages inline until a network stage is submitted to the
    /// dispatcher or the job finishes.
    fn advance_job(&mut self, key: &ResolutionKey, now: Instant) {
        let mut evicted = Vec::new();

        loop {
            let Some(job) = self.jobs.get_mut(key) else {
                return;
            };

            let Some(stage) = job.next_stage() else {
                let error = job
                    .take_last_error()
                    .unwrap_or_else(|| StageError::unavailable("no resolution stage left"));
                self.complete_job(key, Err(ResolveError::from_stage(key.host.as_str(), error)));
                return;
            };

            if stage.is_local() {
                let cache = self.contexts.get(&key.context).cloned();
                let local = LocalResolver {
                    cache: cache.as_deref(),
                    hosts: self.hosts.as_ref(),
                    presets: &self.presets,
                };
                let mut stale_info = None;
                match local.run_stage(stage, key, job.allow_stale(), now, &mut stale_info) {
                    LocalResult::Hit(entry) => {
                        debug!(host = %key.host, stage = %stage, "Local stage hit");
                        self.complete_job(key, Ok(entry));
                        return;
                    }
                    LocalResult::NegativeHit => {
                        let error = ResolveError::name_not_resolved(key.host.as_str());
                        self.complete_job(key, Err(error));
                        return;
                    }
                    LocalResult::Miss => continue,
                }
            }

            let priority = job.priority();
            let job_id = job.id();
            job.begin_stage(stage);
            for (leg, task) in tasks_for(stage).into_iter().enumerate() {
                let claim = SlotClaim {
                    key: key.clone(),
                    job: job_id,
                    leg,
                };
                match self.dispatcher.add(priority, claim) {
                    AddOutcome::Granted(claim) => {
                        let run = StageRunId(self.next_run);
                        self.next_run += 1;
                        self.runs.insert(run, claim);
                        job.push_leg(task, LegState::Running(run));
                        self.effects.push(Effect::Launch(StageLaunch {
                            run,
                            key: key.clone(),
                            stage,
                            task,
                        }));
                        debug!(
                            host = %key.host,
                            job_id = %job_id,
                            stage = %stage,
                            run = %run,
                            "Stage admitted"
                        );
                    }
                    AddOutcome::Queued { ticket, evicted: pushed_out } => {
                        job.push_leg(task, LegState::Queued(ticket));
                        debug!(
                            host = %key.host,
                            job_id = %job_id,
                            stage = %stage,
                            "Stage queued"
                        );
                        evicted.extend(pushed_out);
                    }
                }
            }
            break;
        }

        for (ticket, claim) in evicted {
            self.evict(ticket, claim);
        }
    }

    /// Routes a stage whose legs have all failed through the fallback rules.
    /// Negative cache entries are written only when the whole stage is
    /// terminal.
    fn fail_stage(&mut self, key: &ResolutionKey, active: &ActiveStage, now: Instant) {
        let stage = active.stage;
        let error = active.combined_error();
        let allow_fallback = allows_system_fallback(key, &self.settings);
        let Some(job) = self.jobs.get_mut(key) else {
            return;
        };

        match job.apply_failure(stage, &error, allow_fallback) {
            FailureAction::Continue => {
                warn!(
                    host = %key.host,
                    job_id = %job.id(),
                    stage = %stage,
                    error = %error,
                    next = ?job.remaining_stages().first(),
                    "Stage failed, falling back"
                );
                job.set_last_error(error);
                self.advance_job(key, now);
            }
            FailureAction::Terminal => {
                debug!(
                    host = %key.host,
                    stage = %stage,
                    error = %error,
                    "Stage failed terminally"
                );
                if error.kind == StageErrorKind::NameNotResolved {
                    for task in active.negative_tasks() {
                        self.write_negative(key, task, now);
                    }
                }
                self.complete_job(key, Err(ResolveError::from_stage(key.host.as_str(), error)));
            }
        }
    }

    /// Removes the job, releases its slots and notifies every attached
    /// request in attachment order.
    fn complete_job(&mut self, key: &ResolutionKey, result: Result<HostEntry, ResolveError>) {
        let Some(mut job) = self.jobs.remove(key) else {
            return;
        };
        self.release_active(&mut job);
        job.finish(result.is_ok());

        match &result {
            Ok(entry) => info!(
                host = %key.host,
                job_id = %job.id(),
                source = entry.source.as_str(),
                addresses = entry.addresses.len(),
                requests = job.num_requests(),
                "Job completed"
            ),
            Err(ResolveError::Aborted(reason)) => info!(
                host = %key.host,
                job_id = %job.id(),
                reason = %reason,
                requests = job.num_requests(),
                "Job aborted"
            ),
            Err(error) => info!(
                host = %key.host,
                job_id = %job.id(),
                error = %error,
                requests = job.num_requests(),
                "Job failed"
            ),
        }

        for request in job.take_requests() {
            self.requests.remove(&request.id);
            request.complete(result.clone());
        }
        job.mark_completed();
    }

    /// Withdraws queued legs and abandons running ones.
    fn release_active(&mut self, job: &mut Job) {
        let Some(active) = job.take_active() else {
            return;
        };
        for leg in active.legs {
            match leg.state {
                LegState::Queued(ticket) => {
                    self.dispatcher.cancel(ticket);
                }
                LegState::Running(run) => {
                    if self.runs.remove(&run).is_some() {
                        self.dispatcher.release();
                        self.effects.push(Effect::Cancel(run));
                    }
                }
                LegState::Failed(_) => {}
            }
        }
    }

    fn admit_queued(&mut self) {
        while let Some((ticket, claim)) = self.dispatcher.pop_admitted() {
            let run = StageRunId(self.next_run);
            let started = match self.jobs.get_mut(&claim.key) {
                Some(job) if job.id() == claim.job => job.start_leg(claim.leg, ticket, run),
                _ => None,
            };
            let Some((stage, task)) = started else {
                self.dispatcher.release();
                continue;
            };

            self.next_run += 1;
            debug!(
                host = %claim.key.host,
                job_id = %claim.job,
                stage = %stage,
                run = %run,
                "Queued stage admitted"
            );
            self.effects.push(Effect::Launch(StageLaunch {
                run,
                key: claim.key.clone(),
                stage,
                task,
            }));
            self.runs.insert(run, claim);
        }
    }

    fn reprioritize(&mut self, key: &ResolutionKey) {
        let Some(job) = self.jobs.get(key) else {
            return;
        };
        let priority = job.priority();
        for ticket in job.queued_tickets() {
            self.dispatcher.change_priority(ticket, priority);
        }
    }

    fn evict(&mut self, ticket: Ticket, claim: SlotClaim) {
        let owned = self
            .jobs
            .get(&claim.key)
            .is_some_and(|job| job.id() == claim.job);
        if owned {
            warn!(
                host = %claim.key.host,
                job_id = %claim.job,
                ticket = ?ticket,
                "Queue too large, evicting job"
            );
            self.complete_job(&claim.key, Err(ResolveError::QueueTooLarge));
        }
    }

    fn abort_running_legs(
        &mut self,
        filter: impl Fn(StageTask) -> bool + Copy,
        error: &StageError,
        now: Instant,
    ) {
        let keys: Vec<ResolutionKey> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.has_running_leg(filter))
            .map(|(key, _)| key.clone())
            .collect();

        for key in keys {
            let Some(job) = self.jobs.get_mut(&key) else {
                continue;
            };
            let aborted = job.fail_running_legs(filter, error);
            let settled = !job.has_pending_legs();
            let active = if settled { job.take_active() } else { None };

            for run in aborted {
                if self.runs.remove(&run).is_some() {
                    self.dispatcher.release();
                    self.effects.push(Effect::Cancel(run));
                }
            }

            if let Some(active) = active {
                self.fail_stage(&key, &active, now);
            }
        }
    }

    fn serve_jobs_from_hosts(&mut self) {
        let served: Vec<(ResolutionKey, HostEntry)> = self
            .jobs
            .keys()
            .filter(|key| key.secure_dns_mode != SecureDnsMode::Secure)
            .filter(|key| {
                matches!(
                    key.source,
                    HostResolverSource::Any | HostResolverSource::Dns | HostResolverSource::System
                )
            })
            .filter_map(|key| {
                let entry = self.hosts.lookup(&key.host, key.query_types)?;
                (!entry.is_empty()).then(|| (key.clone(), entry))
            })
            .collect();

        for (key, entry) in served {
            debug!(host = %key.host, "Serving job from hosts after config change");
            self.complete_job(&key, Ok(entry));
        }
    }

    fn write_cache(&self, key: &ResolutionKey, task: StageTask, entry: &HostEntry, now: Instant) {
        let Some(cache) = self.contexts.get(&key.context) else {
            return;
        };
        if !entry.source.is_cacheable() {
            return;
        }
        let ttl = match task {
            StageTask::System => Some(self.options.system_result_ttl),
            _ => entry.ttl,
        };
        let Some(ttl) = ttl.filter(|ttl| !ttl.is_zero()) else {
            return;
        };
        let cache_key = CacheKey::new(
            key.host.clone(),
            key.query_types,
            key.network,
            task.is_secure(),
        );
        cache.store(cache_key, CachedData::Addresses(entry.clone()), ttl, now);
    }

    fn write_negative(&self, key: &ResolutionKey, task: StageTask, now: Instant) {
        let Some(cache) = self.contexts.get(&key.context) else {
            return;
        };
        if self.options.negative_ttl.is_zero() {
            return;
        }
        let cache_key = CacheKey::new(
            key.host.clone(),
            key.query_types,
            key.network,
            task.is_secure(),
        );
        cache.store(
            cache_key,
            CachedData::NegativeResponse,
            self.options.negative_ttl,
            now,
        );
    }
}

impl std::fmt::Debug for ResolverCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverCore")
            .field("settings", &self.settings)
            .field("jobs", &self.jobs.len())
            .field("running", &self.dispatcher.num_running())
            .field("queued", &self.dispatcher.num_queued())
            .finish()
    }
}
