use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host cache bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entries expired for longer than this are never served, even as stale.
    #[serde(default = "default_max_stale_secs")]
    pub max_stale_secs: u64,
}

impl CacheConfig {
    pub fn max_stale(&self) -> Duration {
        Duration::from_secs(self.max_stale_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_stale_secs: default_max_stale_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    10_000
}

fn default_max_stale_secs() -> u64 {
    3600
}
