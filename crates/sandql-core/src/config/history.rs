//! Statement history settings.

use serde::{Deserialize, Serialize};

/// Per-tenant statement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Whether executed statements are appended to the tenant's history.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Keep at most this many entries per tenant (oldest trimmed first).
    #[serde(default)]
    pub max_entries: Option<u64>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_entries: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}
