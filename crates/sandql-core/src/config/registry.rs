//! Handle cache bounds and timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds for the tenant handle cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum number of simultaneously open tenant handles.
    #[serde(default = "default_max_open_handles")]
    pub max_open_handles: usize,

    /// Idle handles older than this are closed by the reaper.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// How long a caller may wait for a free slot or for its tenant's turn.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// How often the reaper sweeps for idle handles.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_open_handles: default_max_open_handles(),
            idle_timeout_secs: default_idle_timeout_secs(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

impl RegistryConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

fn default_max_open_handles() -> usize {
    64
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_acquire_timeout_ms() -> u64 {
    10_000
}

fn default_reap_interval_secs() -> u64 {
    30
}
