use super::handle::HostResolver;
use super::manager::{Collaborators, Manager};
use crate::cache::InMemoryHostCache;
use crate::dns::{MdnsClient, ResolvConfSource, StubDnsClient};
use crate::events::ChangeNotifier;
use crate::hosts::HostsFile;
use crate::system::{TokioSystemResolver, UdpReachabilityProber};
use hostres_application::ports::{
    DnsClient, DnsConfigSource, HostCache, HostsSource, MdnsSource, ReachabilityProber,
    SystemResolver,
};
use hostres_application::scheduler::{CoreOptions, ResolverCore};
use hostres_application::services::{ConfigPresets, DnsSettings};
use hostres_domain::{Config, DomainError, NetworkHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Assembles a [`HostResolver`]. Collaborators that are not supplied get
/// the system defaults derived from the config.
pub struct HostResolverBuilder {
    settings: DnsSettings,
    options: CoreOptions,
    stage_timeout: Duration,
    presets: Result<ConfigPresets, DomainError>,
    network: NetworkHandle,
    dns_config: hostres_domain::config::DnsConfig,
    cache: Option<Arc<dyn HostCache>>,
    system: Option<Arc<dyn SystemResolver>>,
    dns: Option<Arc<dyn DnsClient>>,
    mdns: Option<Arc<dyn MdnsSource>>,
    prober: Option<Arc<dyn ReachabilityProber>>,
    hosts: Option<Arc<dyn HostsSource>>,
    config_source: Option<Arc<dyn DnsConfigSource>>,
    notifier: Option<ChangeNotifier>,
}

impl HostResolverBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: DnsSettings::from_config(&config.resolver),
            options: CoreOptions::from_config(&config.resolver),
            stage_timeout: config.resolver.stage_timeout(),
            presets: ConfigPresets::from_config(&config.resolver.presets),
            network: NetworkHandle::DEFAULT,
            dns_config: config.dns.clone(),
            cache: Some(Arc::new(InMemoryHostCache::from_config(&config.cache))),
            system: None,
            dns: None,
            mdns: None,
            prober: None,
            hosts: None,
            config_source: None,
            notifier: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn HostCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The default context resolves without caching.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn with_system_resolver(mut self, system: Arc<dyn SystemResolver>) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_dns_client(mut self, dns: Arc<dyn DnsClient>) -> Self {
        self.dns = Some(dns);
        self
    }

    pub fn with_mdns(mut self, mdns: Arc<dyn MdnsSource>) -> Self {
        self.mdns = Some(mdns);
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn ReachabilityProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn with_hosts(mut self, hosts: Arc<dyn HostsSource>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    pub fn with_config_source(mut self, config_source: Arc<dyn DnsConfigSource>) -> Self {
        self.config_source = Some(config_source);
        self
    }

    /// Subscribes the manager to `notifier`'s change events.
    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_network(mut self, network: NetworkHandle) -> Self {
        self.network = network;
        self
    }

    /// Reads the DNS configuration and spawns the manager task. Must be
    /// called from within a Tokio runtime.
    pub fn build(self) -> Result<HostResolver, DomainError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            DomainError::InvalidConfig("HostResolver must be built inside a Tokio runtime".into())
        })?;
        let presets = Arc::new(self.presets?);

        let hosts = self
            .hosts
            .unwrap_or_else(|| Arc::new(HostsFile::load(&self.dns_config.hosts_file)));
        let config_source = self
            .config_source
            .unwrap_or_else(|| Arc::new(ResolvConfSource::new(self.dns_config.clone())));
        let dns = self
            .dns
            .unwrap_or_else(|| Arc::new(StubDnsClient::default()));

        let dns_config_available = match config_source.read() {
            Ok(config) => {
                let usable = config.is_usable();
                dns.set_config(Some(config));
                usable
            }
            Err(e) => {
                warn!(error = %e, "DNS configuration unavailable at startup");
                dns.set_config(None);
                false
            }
        };

        let mut core = ResolverCore::new(
            self.settings,
            self.options,
            Arc::clone(&hosts),
            presets,
            self.cache,
        )
        .with_network(self.network);
        core.apply_dns_config(dns_config_available);

        let collaborators = Collaborators {
            system: self
                .system
                .unwrap_or_else(|| Arc::new(TokioSystemResolver::new())),
            dns,
            mdns: self.mdns.unwrap_or_else(|| Arc::new(MdnsClient::default())),
            prober: self
                .prober
                .unwrap_or_else(|| Arc::new(UdpReachabilityProber::new())),
            hosts,
            config_source,
        };

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let manager = Manager::new(
            core,
            collaborators,
            self.stage_timeout,
            commands_rx,
            self.notifier.as_ref().map(ChangeNotifier::subscribe),
            shutdown.clone(),
        );

        info!(
            mode = %self.settings.secure_dns_mode,
            dns_config_available,
            "Starting resolver manager"
        );
        runtime.spawn(manager.run());

        Ok(HostResolver::new(commands_tx, shutdown))
    }
}
