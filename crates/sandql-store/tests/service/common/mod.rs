//! Shared fixtures for service tests.

#![allow(dead_code)]

use sandql_core::{ExecutionResult, RegistryConfig, SandqlConfig};
use sandql_store::SandqlService;
use serde_json::{Map, Value};
use tempfile::TempDir;

/// A service rooted in its own temporary data directory.
pub struct TestContext {
    pub service: SandqlService,
    // keeps the directory alive for the test's duration
    pub dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_registry(registry: RegistryConfig) -> Self {
        Self::with_config(|config| config.registry = registry)
    }

    pub fn with_config(tweak: impl FnOnce(&mut SandqlConfig)) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = SandqlConfig::default();
        config.storage.data_dir = dir.path().join("tenants");
        tweak(&mut config);
        let service = SandqlService::from_config(&config).expect("build service");
        Self { service, dir }
    }

    /// Run a statement and fail the test if it does not succeed.
    pub async fn exec_ok(&self, tenant: &str, sql: &str) -> ExecutionResult {
        let result = self.service.execute_query(tenant, sql).await;
        assert!(!result.is_failure(), "{sql:?} failed for {tenant}: {result:?}");
        result
    }

    /// Rows of a SELECT, failing the test on anything else.
    pub async fn select(&self, tenant: &str, sql: &str) -> (Vec<String>, Vec<Map<String, Value>>) {
        match self.service.execute_query(tenant, sql).await {
            ExecutionResult::Rows { columns, rows, .. } => (columns, rows),
            other => panic!("expected rows for {sql:?}, got {other:?}"),
        }
    }

    pub async fn count(&self, tenant: &str, table: &str) -> i64 {
        let (_, rows) = self
            .select(tenant, &format!("SELECT COUNT(*) AS n FROM {table}"))
            .await;
        rows[0]["n"].as_i64().expect("count is an integer")
    }
}

/// Registry settings with a small handle budget and short waits.
pub fn small_registry(max_open_handles: usize) -> RegistryConfig {
    RegistryConfig {
        max_open_handles,
        idle_timeout_secs: 300,
        acquire_timeout_ms: 2_000,
        reap_interval_secs: 30,
    }
}
