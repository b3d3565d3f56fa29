//! Tenant store location and engine settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where tenant stores live and how each one is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `.sqlite` file per tenant.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// How long the engine waits on a locked database file, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Journal mode applied when a store is opened.
    #[serde(default)]
    pub journal_mode: JournalMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: JournalMode::default(),
        }
    }
}

/// Journal mode for tenant stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/tenants")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}
