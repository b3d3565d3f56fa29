//! Configuration types for sandql.
//!
//! A single YAML file (default `sandql.yaml`) is deserialized into
//! [`SandqlConfig`]. Every section and field has a default, so an empty file
//! (or no file at all) yields a working configuration.
//!
//! ```yaml
//! storage:
//!   data_dir: data/tenants
//! registry:
//!   max_open_handles: 64
//!   idle_timeout_secs: 300
//! guardrails:
//!   classifier_mode: keyword
//!   max_tables_per_tenant: 200
//! ```

pub mod guardrails;
pub mod history;
pub mod registry;
pub mod schema;
pub mod server;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use guardrails::{ClassifierMode, GuardrailsConfig, DEFAULT_DENYLIST};
pub use history::HistoryConfig;
pub use registry::RegistryConfig;
pub use schema::SchemaConfig;
pub use server::{ObservabilityConfig, ServerConfig};
pub use storage::{JournalMode, StorageConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SANDQL_CONFIG";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "sandql.yaml";

/// Complete sandql configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandqlConfig {
    /// Tenant store location and engine settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Handle cache bounds.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Statement guardrails.
    #[serde(default)]
    pub guardrails: GuardrailsConfig,

    /// Schema introspection.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Statement history.
    #[serde(default)]
    pub history: HistoryConfig,

    /// HTTP server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SandqlConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve and load the configuration.
    ///
    /// Lookup order: the explicit path, then `SANDQL_CONFIG`, then
    /// `sandql.yaml` in the working directory. An explicit path that does not
    /// exist is an error; a missing default file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }
        Ok(Self::default())
    }

    /// Reject configurations the registry cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.max_open_handles == 0 {
            return Err(ConfigError::Config(
                "registry.max_open_handles must be at least 1".to_string(),
            ));
        }
        if self.registry.acquire_timeout_ms == 0 {
            return Err(ConfigError::Config(
                "registry.acquire_timeout_ms must be positive".to_string(),
            ));
        }
        if self.registry.idle_timeout_secs == 0 || self.registry.reap_interval_secs == 0 {
            return Err(ConfigError::Config(
                "registry idle timeout and reap interval must be positive".to_string(),
            ));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Config(
                "storage.data_dir must be set".to_string(),
            ));
        }
        if self.guardrails.max_result_rows == 0 {
            return Err(ConfigError::Config(
                "guardrails.max_result_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
