//! # sandql-store
//!
//! Per-tenant embedded stores and the safety-filtered execution path.
//!
//! ## Architecture
//!
//! ```text
//!  execute_query(tenant, sql)
//!        │
//!        ▼
//! ┌─────────────────────┐  rejected  ┌─────────────────────┐
//! │ StatementClassifier ├───────────▶│ Failure (no handle) │
//! └──────────┬──────────┘            └─────────────────────┘
//!            │ allowed
//!            ▼
//! ┌─────────────────────┐ acquire/release ┌──────────────────────┐
//! │ QueryExecutor       │◀───────────────▶│ TenantRegistry       │
//! │ SchemaIntrospector  │                 │ bounded LRU cache of │
//! │ TenantJournal       │                 │ per-tenant handles   │
//! └─────────────────────┘                 └──────────┬───────────┘
//!                                                    │ opened lazily
//!                                                    ▼
//!                                     <data_dir>/t_<tenant>.sqlite
//! ```
//!
//! Statements for one tenant run one at a time in submission order; different
//! tenants never wait on each other except for the global handle budget.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sandql_core::SandqlConfig;
//! use sandql_store::SandqlService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = SandqlService::from_config(&SandqlConfig::default())?;
//!
//! service
//!     .execute_query("u1", "CREATE TABLE t(id INTEGER PRIMARY KEY, v TEXT)")
//!     .await;
//! service.execute_query("u1", "INSERT INTO t(v) VALUES ('a')").await;
//! let rows = service.execute_query("u1", "SELECT * FROM t").await;
//! println!("{}", serde_json::to_string_pretty(&rows)?);
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod journal;
pub mod registry;
pub mod service;
pub mod storage;
mod value;

pub use error::StoreError;
pub use executor::QueryExecutor;
pub use introspect::SchemaIntrospector;
pub use journal::{HistoryEntry, SavedQuery, TenantJournal};
pub use registry::{RegistryStats, TenantHandle, TenantRegistry};
pub use service::SandqlService;
pub use storage::TenantStorage;
