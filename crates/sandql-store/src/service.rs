//! Transport-agnostic entry points used by the HTTP surface and the CLI.

use crate::error::StoreError;
use crate::executor::QueryExecutor;
use crate::introspect::SchemaIntrospector;
use crate::journal::{HistoryEntry, SavedQuery, TenantJournal};
use crate::registry::TenantRegistry;
use crate::storage::TenantStorage;
use sandql_classify::{ClassifyError, StatementClassifier};
use sandql_core::{ExecutionResult, SandqlConfig, SchemaDescription, SeedRows, TenantId};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// One registry shared by the executor, the introspector and the journal.
#[derive(Clone)]
pub struct SandqlService {
    registry: Arc<TenantRegistry>,
    executor: QueryExecutor,
    introspector: SchemaIntrospector,
    journal: TenantJournal,
}

impl SandqlService {
    /// Wire up every component from configuration.
    pub fn from_config(config: &SandqlConfig) -> Result<Self, ClassifyError> {
        let classifier = StatementClassifier::from_config(&config.guardrails)?;
        let storage = TenantStorage::new(config.storage.clone());
        let registry = Arc::new(TenantRegistry::new(storage, config.registry.clone()));

        let executor = QueryExecutor::new(
            Arc::clone(&registry),
            classifier,
            config.guardrails.clone(),
            config.schema.clone(),
        )
        .with_history(config.history.clone());
        let introspector = SchemaIntrospector::new(Arc::clone(&registry), config.schema.clone());
        let journal = TenantJournal::new(Arc::clone(&registry), config.history.clone());

        tracing::info!(
            data_dir = %config.storage.data_dir.display(),
            max_open_handles = config.registry.max_open_handles,
            classifier_mode = ?config.guardrails.classifier_mode,
            "Tenant store service ready"
        );

        Ok(Self {
            registry,
            executor,
            introspector,
            journal,
        })
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn journal(&self) -> &TenantJournal {
        &self.journal
    }

    /// Start the periodic idle sweep.
    pub fn start_reaper(&self) -> JoinHandle<()> {
        self.registry.spawn_reaper()
    }

    /// Run one statement. Successful statements are appended to the tenant's
    /// history, within the same turn, when history is enabled.
    pub async fn execute_query(&self, tenant: &str, sql: &str) -> ExecutionResult {
        match TenantId::new(tenant) {
            Ok(tenant) => self.executor.execute(&tenant, sql).await,
            Err(e) => StoreError::from(e).into_failure(),
        }
    }

    pub async fn describe_schema(&self, tenant: &str) -> Result<SchemaDescription, StoreError> {
        let tenant = TenantId::new(tenant)?;
        self.introspector.describe(&tenant).await
    }

    pub async fn apply_schema(
        &self,
        tenant: &str,
        schema: &SchemaDescription,
        seed_rows: Option<&SeedRows>,
    ) -> ExecutionResult {
        match TenantId::new(tenant) {
            Ok(tenant) => self.executor.apply_schema(&tenant, schema, seed_rows).await,
            Err(e) => StoreError::from(e).into_failure(),
        }
    }

    pub async fn list_history(
        &self,
        tenant: &str,
        limit: Option<u32>,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let tenant = TenantId::new(tenant)?;
        self.journal.list_history(&tenant, limit).await
    }

    pub async fn clear_history(&self, tenant: &str) -> Result<u64, StoreError> {
        let tenant = TenantId::new(tenant)?;
        self.journal.clear_history(&tenant).await
    }

    pub async fn save_query(
        &self,
        tenant: &str,
        title: &str,
        sql: &str,
    ) -> Result<SavedQuery, StoreError> {
        let tenant = TenantId::new(tenant)?;
        self.journal.save_query(&tenant, title, sql).await
    }

    pub async fn list_saved(&self, tenant: &str) -> Result<Vec<SavedQuery>, StoreError> {
        let tenant = TenantId::new(tenant)?;
        self.journal.list_saved(&tenant).await
    }

    pub async fn delete_saved(&self, tenant: &str, id: i64) -> Result<bool, StoreError> {
        let tenant = TenantId::new(tenant)?;
        self.journal.delete_saved(&tenant, id).await
    }

    /// Close every idle handle. Called on graceful shutdown.
    pub async fn shutdown(&self) {
        let closed = self.registry.close_all().await;
        tracing::info!(closed, "Closed tenant stores");
    }
}
