use super::message::{build_query, parse_response, DnsAnswer};
use super::transport::Transport;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use futures::future::join_all;
use hostres_application::ports::{DnsClient, DnsClientConfig};
use hostres_domain::{
    DnsQueryType, EntrySource, HostEntry, Hostname, QueryTypeSet, StageError, StageErrorKind,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Stub resolver for DNS-client stages.
///
/// Insecure queries go to the configured nameservers over UDP, secure ones
/// to the DoH endpoints. A and AAAA are queried concurrently; each query
/// walks `attempts` rounds over the server list before giving up.
#[derive(Default)]
pub struct StubDnsClient {
    config: ArcSwapOption<DnsClientConfig>,
}

impl StubDnsClient {
    pub fn new(config: Option<DnsClientConfig>) -> Self {
        Self {
            config: ArcSwapOption::from(config.map(Arc::new)),
        }
    }

    fn transports(config: &DnsClientConfig, secure: bool) -> Result<Vec<Transport>, StageError> {
        if secure {
            if !config.has_secure_servers() {
                return Err(StageError::unavailable("no DNS-over-HTTPS servers configured"));
            }
            config.doh_servers.iter().map(|url| Transport::https(url)).collect()
        } else {
            if !config.has_insecure_servers() {
                return Err(StageError::unavailable("no nameservers configured"));
            }
            Ok(config.nameservers.iter().map(|addr| Transport::udp(*addr)).collect())
        }
    }

    async fn query_type(
        name: &str,
        query_type: DnsQueryType,
        transports: &[Transport],
        config: &DnsClientConfig,
    ) -> Result<DnsAnswer, StageError> {
        let mut last_error = StageError::unavailable("no servers tried");

        for attempt in 0..config.attempts.max(1) {
            for transport in transports {
                let (_, query) = build_query(name, query_type)?;
                let result = transport
                    .exchange(&query, config.timeout)
                    .await
                    .and_then(|bytes| parse_response(&bytes));

                match result {
                    Ok(answer) if answer.is_nxdomain() => {
                        return Err(StageError::name_not_resolved(name));
                    }
                    Ok(answer) if answer.is_server_error() => {
                        debug!(
                            name,
                            server = %transport,
                            rcode = ?answer.rcode,
                            "Server failure, trying next server"
                        );
                        last_error = StageError::new(
                            StageErrorKind::ServerFailure,
                            format!("{transport} answered {:?}", answer.rcode),
                        );
                    }
                    Ok(answer) => return Ok(answer),
                    Err(e) => {
                        debug!(
                            name,
                            attempt,
                            protocol = transport.protocol(),
                            server = %transport,
                            error = %e,
                            "DNS query failed"
                        );
                        last_error = e;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Queries every requested address family of one candidate name.
    async fn query_name(
        name: &str,
        query_types: QueryTypeSet,
        transports: &[Transport],
        config: &DnsClientConfig,
    ) -> Result<Vec<DnsAnswer>, StageError> {
        let types: Vec<DnsQueryType> = query_types
            .iter()
            .filter(|t| matches!(t, DnsQueryType::A | DnsQueryType::AAAA))
            .collect();

        let results = join_all(
            types
                .iter()
                .map(|t| Self::query_type(name, *t, transports, config)),
        )
        .await;

        let mut answers = Vec::with_capacity(results.len());
        let mut failure: Option<StageError> = None;
        for result in results {
            match result {
                Ok(answer) => answers.push(answer),
                Err(e) if e.kind == StageErrorKind::NameNotResolved => {}
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        let has_addresses = answers.iter().any(|a| !a.addresses.is_empty());
        match failure {
            Some(e) if !has_addresses => Err(e),
            _ => Ok(answers),
        }
    }

    /// Names to try. Single-label names go through the search list first
    /// and fall back to the bare name, as resolv.conf does with `ndots:1`.
    fn candidate_names(host: &Hostname, config: &DnsClientConfig) -> Vec<String> {
        let bare = host.as_str().to_string();
        if bare.contains('.') {
            return vec![bare];
        }
        let mut names: Vec<String> = config
            .search_domains
            .iter()
            .map(|domain| format!("{}.{}", bare, domain.trim_matches('.')))
            .collect();
        names.push(bare);
        names
    }
}

#[async_trait]
impl DnsClient for StubDnsClient {
    async fn query(
        &self,
        host: &Hostname,
        query_types: QueryTypeSet,
        secure: bool,
    ) -> Result<HostEntry, StageError> {
        let config = self
            .config
            .load_full()
            .ok_or_else(|| StageError::unavailable("no DNS configuration loaded"))?;

        if !query_types.has_address_type() {
            return Err(StageError::unavailable(format!(
                "DNS client only resolves addresses, not {query_types:?}"
            )));
        }

        let transports = Self::transports(&config, secure)?;
        let source = if secure {
            EntrySource::SecureDns
        } else {
            EntrySource::Dns
        };

        // A failing candidate does not end the walk; its error is reported
        // only if no later candidate has addresses.
        let mut failure: Option<StageError> = None;
        for name in Self::candidate_names(host, &config) {
            let answers = match Self::query_name(&name, query_types, &transports, &config).await {
                Ok(answers) => answers,
                Err(e) => {
                    debug!(name = %name, error = %e, "Candidate name failed, trying next");
                    failure.get_or_insert(e);
                    continue;
                }
            };

            let mut addresses = Vec::new();
            let mut aliases = Vec::new();
            let mut ttl: Option<Duration> = None;
            for answer in answers {
                addresses.extend(answer.addresses);
                if aliases.is_empty() {
                    aliases = answer.aliases;
                }
                if let Some(answer_ttl) = answer.min_ttl {
                    ttl = Some(ttl.map_or(answer_ttl, |current| current.min(answer_ttl)));
                }
            }

            if addresses.is_empty() {
                debug!(name = %name, "No addresses for candidate name");
                continue;
            }

            let mut entry = HostEntry::new(addresses, source).with_aliases(aliases);
            if let Some(ttl) = ttl {
                entry = entry.with_ttl(ttl);
            }
            return Ok(entry);
        }

        Err(failure.unwrap_or_else(|| StageError::name_not_resolved(host.as_str())))
    }

    fn config(&self) -> Option<Arc<DnsClientConfig>> {
        self.config.load_full()
    }

    fn set_config(&self, config: Option<DnsClientConfig>) {
        match &config {
            Some(c) => debug!(
                nameservers = c.nameservers.len(),
                doh_servers = c.doh_servers.len(),
                "DNS client configuration updated"
            ),
            None => warn!("DNS client configuration cleared"),
        }
        self.config.store(config.map(Arc::new));
    }
}
