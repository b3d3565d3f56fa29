//! Statement guardrails.

use serde::{Deserialize, Serialize};

/// Keywords rejected anywhere in a statement.
pub const DEFAULT_DENYLIST: [&str; 9] = [
    "DROP", "TRUNCATE", "DELETE", "ALTER", "MODIFY", "RENAME", "REMOVE", "GRANT", "REVOKE",
];

/// Limits applied to user-supplied statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailsConfig {
    /// Destructive keywords that reject a statement.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,

    /// How the denylist is applied.
    #[serde(default)]
    pub classifier_mode: ClassifierMode,

    /// Maximum rows returned by one read; extra rows are dropped and the
    /// result is flagged as truncated.
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,

    /// Maximum number of tables one tenant may create. Unset means unlimited.
    #[serde(default)]
    pub max_tables_per_tenant: Option<usize>,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            classifier_mode: ClassifierMode::default(),
            max_result_rows: default_max_result_rows(),
            max_tables_per_tenant: None,
        }
    }
}

/// Denylist matching strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Whole-word keyword scan over the full text, literals included.
    #[default]
    Keyword,
    /// Parse the statement and check its root verb; falls back to the
    /// keyword scan when the text does not parse.
    Parsed,
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|k| k.to_string()).collect()
}

fn default_max_result_rows() -> usize {
    10_000
}
