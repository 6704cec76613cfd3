#![allow(dead_code)]
use async_trait::async_trait;
use hostres_application::ports::{
    DnsClient, DnsClientConfig, DnsConfigSource, MdnsSource, ReachabilityProber, SystemResolver,
};
use hostres_domain::{
    DomainError, EntrySource, HostEntry, Hostname, QueryTypeSet, StageError, StageErrorKind,
};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Scripted outcome of a mocked stage call.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub result: Result<Vec<IpAddr>, StageErrorKind>,
    pub delay: Duration,
    /// Held calls wait here until the test adds a permit.
    pub gate: Option<Arc<Semaphore>>,
}

impl Scripted {
    pub fn ok(ip: &str) -> Self {
        Self {
            result: Ok(vec![ip.parse().unwrap()]),
            delay: Duration::ZERO,
            gate: None,
        }
    }

    pub fn fail(kind: StageErrorKind) -> Self {
        Self {
            result: Err(kind),
            delay: Duration::ZERO,
            gate: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn held_by(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    async fn play(&self, host: &Hostname, source: EntrySource) -> Result<HostEntry, StageError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.result {
            Ok(addresses) => {
                Ok(HostEntry::new(addresses.clone(), source).with_ttl(Duration::from_secs(60)))
            }
            Err(StageErrorKind::NameNotResolved) => {
                Err(StageError::name_not_resolved(host.as_str()))
            }
            Err(kind) => Err(StageError::new(*kind, "scripted failure")),
        }
    }
}

pub struct MockSystemResolver {
    script: Mutex<Scripted>,
    calls: AtomicUsize,
}

impl MockSystemResolver {
    pub fn new(script: Scripted) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemResolver for MockSystemResolver {
    async fn resolve(
        &self,
        host: &Hostname,
        _query_types: QueryTypeSet,
    ) -> Result<HostEntry, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap().clone();
        script.play(host, EntrySource::System).await
    }
}

pub struct MockDnsClient {
    secure: Scripted,
    insecure: Scripted,
    config: Mutex<Option<Arc<DnsClientConfig>>>,
    secure_calls: AtomicUsize,
    insecure_calls: AtomicUsize,
}

impl MockDnsClient {
    pub fn new(secure: Scripted, insecure: Scripted) -> Arc<Self> {
        Arc::new(Self {
            secure,
            insecure,
            config: Mutex::new(None),
            secure_calls: AtomicUsize::new(0),
            insecure_calls: AtomicUsize::new(0),
        })
    }

    pub fn secure_calls(&self) -> usize {
        self.secure_calls.load(Ordering::SeqCst)
    }

    pub fn insecure_calls(&self) -> usize {
        self.insecure_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsClient for MockDnsClient {
    async fn query(
        &self,
        host: &Hostname,
        _query_types: QueryTypeSet,
        secure: bool,
    ) -> Result<HostEntry, StageError> {
        if secure {
            self.secure_calls.fetch_add(1, Ordering::SeqCst);
            self.secure.play(host, EntrySource::SecureDns).await
        } else {
            self.insecure_calls.fetch_add(1, Ordering::SeqCst);
            self.insecure.play(host, EntrySource::Dns).await
        }
    }

    fn config(&self) -> Option<Arc<DnsClientConfig>> {
        self.config.lock().unwrap().clone()
    }

    fn set_config(&self, config: Option<DnsClientConfig>) {
        *self.config.lock().unwrap() = config.map(Arc::new);
    }
}

pub struct MockMdns;

#[async_trait]
impl MdnsSource for MockMdns {
    async fn query(
        &self,
        host: &Hostname,
        _query_types: QueryTypeSet,
    ) -> Result<HostEntry, StageError> {
        if host.as_str() == "printer.local" {
            return Ok(HostEntry::new(
                vec!["192.168.1.40".parse().unwrap()],
                EntrySource::MulticastDns,
            ));
        }
        Err(StageError::name_not_resolved(host.as_str()))
    }
}

pub struct MockProber {
    reachable: bool,
    probes: AtomicUsize,
}

impl MockProber {
    pub fn new(reachable: bool) -> Arc<Self> {
        Arc::new(Self {
            reachable,
            probes: AtomicUsize::new(0),
        })
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReachabilityProber for MockProber {
    async fn probe_ipv6(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

pub struct MockConfigSource {
    config: Mutex<Result<DnsClientConfig, DomainError>>,
    reads: AtomicUsize,
}

impl MockConfigSource {
    pub fn new(config: Result<DnsClientConfig, DomainError>) -> Arc<Self> {
        Arc::new(Self {
            config: Mutex::new(config),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, config: Result<DnsClientConfig, DomainError>) {
        *self.config.lock().unwrap() = config;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl DnsConfigSource for MockConfigSource {
    fn read(&self) -> Result<DnsClientConfig, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.config.lock().unwrap().clone()
    }
}

pub fn usable_config() -> DnsClientConfig {
    DnsClientConfig {
        nameservers: vec!["192.0.2.53:53".parse().unwrap()],
        doh_servers: vec!["https://doh.example/dns-query".to_string()],
        search_domains: Vec::new(),
        timeout: Duration::from_millis(500),
        attempts: 1,
    }
}

pub fn empty_config() -> DnsClientConfig {
    DnsClientConfig {
        nameservers: Vec::new(),
        doh_servers: Vec::new(),
        ..usable_config()
    }
}
