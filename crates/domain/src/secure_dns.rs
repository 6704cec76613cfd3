use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Manager-wide (or effective per-request) secure DNS mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecureDnsMode {
    /// Only insecure stages.
    Off,
    /// Secure stages first, insecure stages as fallback.
    #[default]
    Automatic,
    /// Only secure DNS-client stages. No system resolver, no fallback.
    Secure,
}

impl SecureDnsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Automatic => "automatic",
            Self::Secure => "secure",
        }
    }
}

impl fmt::Display for SecureDnsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecureDnsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "automatic" | "auto" => Ok(Self::Automatic),
            "secure" | "required" => Ok(Self::Secure),
            other => Err(format!("Unknown secure DNS mode: {other}")),
        }
    }
}

/// Per-request secure DNS policy. A request may only restrict the global
/// mode, never relax it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecureDnsPolicy {
    /// Follow the manager's mode.
    #[default]
    Allow,
    /// Force `Off`, unless the manager requires secure DNS.
    Disable,
    /// Force `Secure`.
    Require,
}

impl SecureDnsPolicy {
    /// Reconciles this policy with the manager's global mode.
    pub fn effective_mode(self, global: SecureDnsMode) -> SecureDnsMode {
        if global == SecureDnsMode::Secure {
            return SecureDnsMode::Secure;
        }
        match self {
            Self::Allow => global,
            Self::Disable => SecureDnsMode::Off,
            Self::Require => SecureDnsMode::Secure,
        }
    }
}

impl FromStr for SecureDnsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "disable" | "off" => Ok(Self::Disable),
            "require" | "secure" => Ok(Self::Require),
            other => Err(format!("Unknown secure DNS policy: {other}")),
        }
    }
}
