use hostres_application::ports::{CacheKey, HostCache, HostsSource};
use hostres_application::scheduler::{
    Completion, CoreOptions, Effect, RequestId, ResolverCore, StageLaunch, StageRunId,
};
use hostres_application::services::{ConfigPresets, DnsSettings};
use hostres_domain::host_entry::filter_addresses;
use hostres_domain::{
    CachedData, ContextId, DomainError, EntrySource, HostEntry, Hostname, NetworkHandle,
    QueryTypeSet, ResolveParameters, SecureDnsMode, StageError, Staleness,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

// ============================================================================
// Mock HostCache
// ============================================================================

#[derive(Default)]
pub struct MockHostCache {
    entries: Mutex<HashMap<CacheKey, (CachedData, Instant)>>,
    stores: Mutex<Vec<(CacheKey, CachedData, Duration)>>,
    clears: AtomicUsize,
}

impl MockHostCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry that expires at `expires`.
    pub fn insert(&self, key: CacheKey, data: CachedData, expires: Instant) {
        self.entries.lock().unwrap().insert(key, (data, expires));
    }

    pub fn stores(&self) -> Vec<(CacheKey, CachedData, Duration)> {
        self.stores.lock().unwrap().clone()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl HostCache for MockHostCache {
    fn lookup(&self, key: &CacheKey, now: Instant) -> Option<(CachedData, Staleness)> {
        let entries = self.entries.lock().unwrap();
        let (data, expires) = entries.get(key)?;
        let staleness = if now >= *expires {
            Staleness {
                expired_by: Some(now.duration_since(*expires)),
                ..Default::default()
            }
        } else {
            Staleness::default()
        };
        Some((data.clone(), staleness))
    }

    fn store(&self, key: CacheKey, data: CachedData, ttl: Duration, now: Instant) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.clone(), (data.clone(), now + ttl));
        self.stores.lock().unwrap().push((key, data, ttl));
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

// ============================================================================
// Mock HostsSource
// ============================================================================

#[derive(Default)]
pub struct MockHostsSource {
    entries: Mutex<HashMap<Hostname, Vec<IpAddr>>>,
    reloads: AtomicUsize,
}

impl MockHostsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, host: &str, addresses: &[&str]) {
        let addresses = addresses.iter().map(|a| a.parse().unwrap()).collect();
        self.entries
            .lock()
            .unwrap()
            .insert(Hostname::parse(host).unwrap(), addresses);
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl HostsSource for MockHostsSource {
    fn lookup(&self, host: &Hostname, query_types: QueryTypeSet) -> Option<HostEntry> {
        let entries = self.entries.lock().unwrap();
        let addresses = filter_addresses(entries.get(host)?, query_types);
        (!addresses.is_empty()).then(|| HostEntry::new(addresses, EntrySource::Hosts))
    }

    fn reload(&self) -> Result<(), DomainError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn settings(mode: SecureDnsMode) -> DnsSettings {
    DnsSettings {
        secure_dns_mode: mode,
        ..DnsSettings::default()
    }
}

pub fn options(max_concurrent_stages: usize) -> CoreOptions {
    CoreOptions {
        max_concurrent_stages,
        ..CoreOptions::default()
    }
}

pub fn host(name: &str) -> Hostname {
    Hostname::parse(name).unwrap()
}

pub fn entry(addresses: &[&str], source: EntrySource, ttl_secs: u64) -> HostEntry {
    let addresses = addresses.iter().map(|a| a.parse().unwrap()).collect();
    HostEntry::new(addresses, source).with_ttl(Duration::from_secs(ttl_secs))
}

pub fn cache_key(name: &str, secure: bool) -> CacheKey {
    CacheKey::new(host(name), QueryTypeSet::ADDRESS, NetworkHandle::DEFAULT, secure)
}

pub fn recv(rx: &mut oneshot::Receiver<Completion>) -> Completion {
    rx.try_recv().expect("completion should have been delivered")
}

pub fn assert_pending(rx: &mut oneshot::Receiver<Completion>) {
    assert!(
        matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)),
        "request completed early"
    );
}

// ============================================================================
// Core harness
// ============================================================================

/// A `ResolverCore` wired to mock caches and hosts, with a frozen clock and a
/// loaded DNS configuration.
pub struct Harness {
    pub core: ResolverCore,
    pub cache: Arc<MockHostCache>,
    pub hosts: Arc<MockHostsSource>,
    pub now: Instant,
}

impl Harness {
    pub fn new(settings: DnsSettings, options: CoreOptions) -> Self {
        Self::with_presets(settings, options, ConfigPresets::default())
    }

    pub fn with_presets(
        settings: DnsSettings,
        options: CoreOptions,
        presets: ConfigPresets,
    ) -> Self {
        let cache = Arc::new(MockHostCache::new());
        let hosts = Arc::new(MockHostsSource::new());
        let now = Instant::now();
        let mut core = ResolverCore::new(
            settings,
            options,
            hosts.clone(),
            Arc::new(presets),
            Some(cache.clone()),
        );
        core.apply_dns_config(true);
        core.on_ipv6_probed(true, now);

        Self {
            core,
            cache,
            hosts,
            now,
        }
    }

    pub fn resolve(
        &mut self,
        name: &str,
        params: ResolveParameters,
    ) -> (Option<RequestId>, oneshot::Receiver<Completion>) {
        self.resolve_in(ContextId::DEFAULT, name, params)
    }

    pub fn resolve_in(
        &mut self,
        context: ContextId,
        name: &str,
        params: ResolveParameters,
    ) -> (Option<RequestId>, oneshot::Receiver<Completion>) {
        let (tx, rx) = oneshot::channel();
        let id = self.core.resolve(host(name), params, context, tx, self.now);
        (id, rx)
    }

    pub fn effects(&mut self) -> Vec<Effect> {
        self.core.take_effects()
    }

    /// Drains effects and keeps only stage launches.
    pub fn launches(&mut self) -> Vec<StageLaunch> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Launch(launch) => Some(launch),
                _ => None,
            })
            .collect()
    }

    pub fn complete(&mut self, run: StageRunId, result: Result<HostEntry, StageError>) {
        self.core.on_stage_complete(run, result, self.now);
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}
