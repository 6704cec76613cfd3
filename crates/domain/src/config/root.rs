use super::errors::ConfigError;
use super::{CacheConfig, DnsConfig, LoggingConfig, ResolverConfig};
use crate::SecureDnsMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub secure_dns_mode: Option<SecureDnsMode>,
    pub max_concurrent_stages: Option<usize>,
    pub log_level: Option<String>,
}

impl Config {
    /// Loads `path` (defaults when `None`) and applies `overrides`.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(mode) = overrides.secure_dns_mode {
            self.resolver.secure_dns_mode = mode;
        }
        if let Some(limit) = overrides.max_concurrent_stages {
            self.resolver.max_concurrent_stages = limit;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.max_concurrent_stages == 0 {
            return Err(ConfigError::Validation(
                "resolver.max_concurrent_stages must be at least 1".to_string(),
            ));
        }
        if self.resolver.stage_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "resolver.stage_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.dns.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "dns.query_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.dns.attempts == 0 {
            return Err(ConfigError::Validation(
                "dns.attempts must be at least 1".to_string(),
            ));
        }
        for url in &self.dns.doh_servers {
            if !url.starts_with("https://") || url.len() <= "https://".len() {
                return Err(ConfigError::Validation(format!(
                    "Invalid DoH server '{url}': must be an https:// URL"
                )));
            }
        }
        for (host, addresses) in &self.resolver.presets {
            if addresses.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Preset '{host}' has no addresses"
                )));
            }
        }
        Ok(())
    }
}
