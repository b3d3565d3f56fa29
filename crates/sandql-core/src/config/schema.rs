//! Schema introspection settings.

use serde::{Deserialize, Serialize};

/// Tables hidden from tenant schema descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Application-owned tables living inside each tenant store.
    /// `sqlite_*` engine tables are always hidden on top of these.
    #[serde(default = "default_reserved_tables")]
    pub reserved_tables: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            reserved_tables: default_reserved_tables(),
        }
    }
}

impl SchemaConfig {
    /// Check if a table belongs to the application rather than the tenant.
    pub fn is_reserved(&self, table: &str) -> bool {
        table.to_ascii_lowercase().starts_with("sqlite_")
            || self
                .reserved_tables
                .iter()
                .any(|t| t.eq_ignore_ascii_case(table))
    }
}

fn default_reserved_tables() -> Vec<String> {
    vec![
        "history".to_string(),
        "saved_queries".to_string(),
        "users".to_string(),
    ]
}
