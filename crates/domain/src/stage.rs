use std::fmt;

/// Whether a cache or DNS-client stage works on secure or insecure results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Security {
    Insecure,
    Secure,
}

impl Security {
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }
}

/// One element of a job's resolution plan. Stages are data; the manager maps
/// each network stage onto a collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Pseudo-stage for IP-literal hosts. Yields the address directly.
    IpLiteral,
    CacheLookup(Security),
    Hosts,
    ConfigPreset,
    System,
    DnsClient(Security),
    /// Secure and insecure DNS-client queries racing, one slot each.
    DnsRace,
    MulticastDns,
}

impl Stage {
    /// Local stages complete synchronously and never take a dispatcher slot.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::IpLiteral | Self::CacheLookup(_) | Self::Hosts | Self::ConfigPreset
        )
    }

    pub fn is_network(&self) -> bool {
        !self.is_local()
    }

    pub fn is_cache_lookup(&self) -> bool {
        matches!(self, Self::CacheLookup(_))
    }

    /// Stages whose result depends on the insecure network path.
    pub fn is_insecure_network(&self) -> bool {
        matches!(
            self,
            Self::System | Self::DnsClient(Security::Insecure) | Self::DnsRace
        )
    }

    pub fn is_dns_client(&self) -> bool {
        matches!(self, Self::DnsClient(_) | Self::DnsRace)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpLiteral => "ip_literal",
            Self::CacheLookup(Security::Insecure) => "cache_insecure",
            Self::CacheLookup(Security::Secure) => "cache_secure",
            Self::Hosts => "hosts",
            Self::ConfigPreset => "config_preset",
            Self::System => "system",
            Self::DnsClient(Security::Insecure) => "dns_insecure",
            Self::DnsClient(Security::Secure) => "dns_secure",
            Self::DnsRace => "dns_race",
            Self::MulticastDns => "mdns",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
