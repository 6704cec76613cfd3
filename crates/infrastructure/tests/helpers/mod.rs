#![allow(dead_code)]
pub mod dns_server_mock;
pub mod mock_collaborators;

pub use dns_server_mock::{dead_server_addr, MockAnswer, MockDnsServer};
pub use mock_collaborators::{
    empty_config, usable_config, MockConfigSource, MockDnsClient, MockMdns, MockProber,
    MockSystemResolver, Scripted,
};

use hostres_domain::Config;
use hostres_domain::SecureDnsMode;
use hostres_infrastructure::{HostResolver, HostResolverBuilder, HostsFile, InMemoryHostCache};
use std::sync::Arc;

/// Mocked collaborators plus the resolver built over them.
pub struct TestResolver {
    pub resolver: HostResolver,
    pub system: Arc<MockSystemResolver>,
    pub dns: Arc<MockDnsClient>,
    pub prober: Arc<MockProber>,
    pub config_source: Arc<MockConfigSource>,
}

pub struct TestResolverBuilder {
    pub config: Config,
    pub system: Scripted,
    pub secure: Scripted,
    pub insecure: Scripted,
    pub dns_config: hostres_application::ports::DnsClientConfig,
    pub hosts: &'static str,
    pub notifier: Option<hostres_infrastructure::ChangeNotifier>,
    pub cache: Option<Arc<InMemoryHostCache>>,
}

impl TestResolverBuilder {
    pub fn new(mode: SecureDnsMode) -> Self {
        let mut config = Config::default();
        config.resolver.secure_dns_mode = mode;
        Self {
            config,
            system: Scripted::ok("192.0.2.1"),
            secure: Scripted::ok("192.0.2.2"),
            insecure: Scripted::ok("192.0.2.3"),
            dns_config: usable_config(),
            hosts: "192.0.2.50 intranet.lan\n",
            notifier: None,
            cache: None,
        }
    }

    pub fn build(self) -> TestResolver {
        let system = MockSystemResolver::new(self.system);
        let dns = MockDnsClient::new(self.secure, self.insecure);
        let prober = MockProber::new(true);
        let config_source = MockConfigSource::new(Ok(self.dns_config));

        let mut builder = HostResolverBuilder::new(&self.config)
            .with_system_resolver(system.clone())
            .with_dns_client(dns.clone())
            .with_mdns(Arc::new(MockMdns))
            .with_prober(prober.clone())
            .with_hosts(Arc::new(HostsFile::from_content(self.hosts)))
            .with_config_source(config_source.clone());
        if let Some(notifier) = self.notifier {
            builder = builder.with_notifier(notifier);
        }
        if let Some(cache) = self.cache {
            builder = builder.with_cache(cache);
        }

        TestResolver {
            resolver: builder.build().unwrap(),
            system,
            dns,
            prober,
            config_source,
        }
    }
}
