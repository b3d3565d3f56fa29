//! # sandql-core
//!
//! Types shared by every sandql crate:
//!
//! - [`TenantId`]: the opaque partition key for one user's data space
//! - [`StatementVerdict`] / [`StatementCategory`]: classifier output
//! - [`ExecutionResult`] / [`FailureKind`]: normalized statement outcomes
//! - [`SchemaDescription`] / [`ColumnDescriptor`]: introspected tenant schema
//! - [`SandqlConfig`]: the YAML configuration tree

// Configuration types shared across all sandql crates
pub mod config;

pub mod result;
pub mod schema;
pub mod tenant;
pub mod verdict;

pub use config::{
    ClassifierMode, ConfigError, GuardrailsConfig, HistoryConfig, JournalMode,
    ObservabilityConfig, RegistryConfig, SandqlConfig, SchemaConfig, ServerConfig, StorageConfig,
};
pub use result::{ExecutionResult, FailureKind};
pub use schema::{ColumnDescriptor, SchemaDescription, SeedRows};
pub use tenant::{TenantId, TenantIdError};
pub use verdict::{StatementCategory, StatementVerdict};
