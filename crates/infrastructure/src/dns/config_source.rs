use hostres_application::ports::{DnsClientConfig, DnsConfigSource};
use hostres_domain::config::DnsConfig;
use hostres_domain::DomainError;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::{debug, warn};

const DNS_PORT: u16 = 53;

/// Nameservers and search list read from a resolv.conf file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvConf {
    pub nameservers: Vec<SocketAddr>,
    pub search_domains: Vec<String>,
}

/// Parses resolv.conf syntax. Unknown directives are ignored; a later
/// `search` or `domain` line replaces an earlier one, as in glibc.
pub fn parse_resolv_conf(content: &str) -> ResolvConf {
    let mut conf = ResolvConf::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("nameserver") => {
                let Some(value) = fields.next() else {
                    continue;
                };
                // Zone ids ("fe80::1%eth0") cannot be carried by SocketAddr.
                let ip = value.split('%').next().unwrap_or(value);
                match ip.parse::<IpAddr>() {
                    Ok(ip) => conf.nameservers.push(SocketAddr::new(ip, DNS_PORT)),
                    Err(_) => debug!(value, "Skipping invalid nameserver"),
                }
            }
            Some("search") => {
                conf.search_domains = fields.map(|d| d.trim_end_matches('.').to_string()).collect();
            }
            Some("domain") => {
                conf.search_domains = fields
                    .next()
                    .map(|d| vec![d.trim_end_matches('.').to_string()])
                    .unwrap_or_default();
            }
            _ => {}
        }
    }

    conf
}

/// Parses "ip" or "ip:port" (IPv6 with port as "[ip]:port").
pub fn parse_nameserver(value: &str) -> Result<SocketAddr, DomainError> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| DomainError::InvalidConfig(format!("invalid nameserver '{value}'")))
}

/// System DNS configuration: resolv.conf merged with the `[dns]` section.
///
/// Explicit nameservers in the config replace the ones in resolv.conf.
/// DoH endpoints, timeout and attempts always come from the config.
pub struct ResolvConfSource {
    path: PathBuf,
    dns: DnsConfig,
}

impl ResolvConfSource {
    pub fn new(dns: DnsConfig) -> Self {
        Self {
            path: PathBuf::from(&dns.resolv_conf),
            dns,
        }
    }

    fn read_resolv_conf(&self) -> ResolvConf {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_resolv_conf(&content),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read resolv.conf");
                ResolvConf::default()
            }
        }
    }
}

impl DnsConfigSource for ResolvConfSource {
    fn read(&self) -> Result<DnsClientConfig, DomainError> {
        let system = self.read_resolv_conf();

        let nameservers = if self.dns.nameservers.is_empty() {
            system.nameservers
        } else {
            self.dns
                .nameservers
                .iter()
                .map(|s| parse_nameserver(s))
                .collect::<Result<Vec<_>, _>>()?
        };

        let config = DnsClientConfig {
            nameservers,
            doh_servers: self.dns.doh_servers.clone(),
            search_domains: system.search_domains,
            timeout: self.dns.query_timeout(),
            attempts: self.dns.attempts,
        };

        debug!(
            nameservers = config.nameservers.len(),
            doh_servers = config.doh_servers.len(),
            search_domains = config.search_domains.len(),
            "DNS configuration read"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolv_conf() {
        let conf = parse_resolv_conf(
            "# generated\nnameserver 192.0.2.53\nnameserver fe80::1%eth0\nnameserver bogus\n\
             domain corp.example\nsearch lan. example.com\noptions ndots:2\n",
        );

        assert_eq!(
            conf.nameservers,
            vec![
                "192.0.2.53:53".parse::<SocketAddr>().unwrap(),
                "[fe80::1]:53".parse::<SocketAddr>().unwrap(),
            ]
        );
        assert_eq!(conf.search_domains, vec!["lan", "example.com"]);
    }

    #[test]
    fn test_parse_nameserver_forms() {
        assert_eq!(parse_nameserver("192.0.2.1").unwrap().port(), 53);
        assert_eq!(parse_nameserver("192.0.2.1:5353").unwrap().port(), 5353);
        assert_eq!(parse_nameserver("[2001:db8::1]:54").unwrap().port(), 54);
        assert!(parse_nameserver("2001:db8::1").unwrap().is_ipv6());
        assert!(parse_nameserver("dns.example").is_err());
    }

    #[test]
    fn test_explicit_nameservers_override_resolv_conf() {
        let dns = DnsConfig {
            nameservers: vec!["127.0.0.1:5300".to_string()],
            resolv_conf: "/nonexistent/resolv.conf".to_string(),
            doh_servers: Vec::new(),
            ..DnsConfig::default()
        };

        let config = ResolvConfSource::new(dns).read().unwrap();

        assert_eq!(config.nameservers, vec!["127.0.0.1:5300".parse().unwrap()]);
        assert!(config.search_domains.is_empty());
        assert!(!config.has_secure_servers());
        assert_eq!(config.attempts, 2);
    }

    #[test]
    fn test_missing_resolv_conf_without_servers_is_not_usable() {
        let dns = DnsConfig {
            resolv_conf: "/nonexistent/resolv.conf".to_string(),
            doh_servers: Vec::new(),
            ..DnsConfig::default()
        };

        let config = ResolvConfSource::new(dns).read().unwrap();

        assert!(!config.is_usable());
    }
}
