use crate::DomainError;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Suffix of names owned by multicast DNS (RFC 6762).
pub const MDNS_SUFFIX: &str = ".local";

const LOCALHOST_NAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "localhost6",
    "localhost6.localdomain6",
    "ip6-localhost",
    "ip6-loopback",
];

/// Normalized hostname or IP-literal text.
///
/// Lowercased, trailing dot and IPv6 brackets stripped. Cloning is an
/// atomic increment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname {
    text: Arc<str>,
    ip: Option<IpAddr>,
}

impl Hostname {
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyHostname);
        }

        let unbracketed = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(trimmed);

        if let Ok(ip) = unbracketed.parse::<IpAddr>() {
            return Ok(Self {
                text: Arc::from(ip.to_string().as_str()),
                ip: Some(ip),
            });
        }

        let name = unbracketed
            .strip_suffix('.')
            .unwrap_or(unbracketed)
            .to_ascii_lowercase();

        if name.is_empty() {
            return Err(DomainError::EmptyHostname);
        }
        if name.len() > MAX_HOSTNAME_LEN {
            return Err(DomainError::HostnameTooLong(name));
        }

        for label in name.split('.') {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(DomainError::InvalidHostname(input.to_string()));
            }
            let valid_chars = label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
            if !valid_chars || label.starts_with('-') || label.ends_with('-') {
                return Err(DomainError::InvalidHostname(input.to_string()));
            }
        }

        Ok(Self {
            text: Arc::from(name.as_str()),
            ip: None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_arc(&self) -> &Arc<str> {
        &self.text
    }

    pub fn ip_literal(&self) -> Option<IpAddr> {
        self.ip
    }

    pub fn is_ip_literal(&self) -> bool {
        self.ip.is_some()
    }

    pub fn is_localhost(&self) -> bool {
        if self.ip.is_some() {
            return false;
        }
        LOCALHOST_NAMES.contains(&self.as_str()) || self.text.ends_with(".localhost")
    }

    /// True for names the resolver should send to multicast DNS.
    pub fn is_multicast_dns(&self) -> bool {
        self.ip.is_none() && (self.text.ends_with(MDNS_SUFFIX) || &*self.text == "local")
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::str::FromStr for Hostname {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
