//! Safety-filtered statement execution.
//!
//! Every statement is classified first. A rejected statement never touches
//! the registry, so no handle is opened on its behalf. Accepted statements run
//! under the tenant's handle and come back as a normalized
//! [`ExecutionResult`]; engine errors become `Failure` values, never panics.
//!
//! Connection work goes through [`Executor`] methods on `&mut SqliteConnection`,
//! whose boxed futures are `Send` for any borrow, so callers can spawn them.

use crate::error::StoreError;
use crate::introspect;
use crate::journal;
use crate::registry::TenantRegistry;
use crate::value;
use futures::TryStreamExt;
use regex::Regex;
use sandql_classify::{leading_keyword, StatementClassifier};
use sandql_core::{
    ExecutionResult, GuardrailsConfig, HistoryConfig, SchemaConfig, StatementCategory, TenantId,
};
use sqlx::sqlite::SqliteConnection;
use sqlx::{Column, Executor, Statement};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

/// `CREATE [TEMP|VIRTUAL] TABLE [IF NOT EXISTS] [schema.]name`, capturing the
/// name in one of its quoting forms.
static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\bCREATE\s+(?:TEMP(?:ORARY)?\s+|VIRTUAL\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:\w+\s*\.\s*)?(?:"((?:[^"]|"")+)"|\[([^\]]+)\]|`([^`]+)`|(\w+))"#,
    )
    .expect("valid CREATE TABLE pattern")
});

/// Distinct table names a statement creates, unquoted, in order of appearance.
fn created_tables(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in CREATE_TABLE.captures_iter(sql) {
        let Some(name) = (1..=4).find_map(|i| caps.get(i)) else {
            continue;
        };
        let name = name.as_str().replace("\"\"", "\"");
        if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            names.push(name);
        }
    }
    names
}

/// Runs tenant statements through the classifier and the registry.
#[derive(Clone)]
pub struct QueryExecutor {
    registry: Arc<TenantRegistry>,
    classifier: StatementClassifier,
    guardrails: GuardrailsConfig,
    schema: SchemaConfig,
    history: HistoryConfig,
}

impl QueryExecutor {
    pub fn new(
        registry: Arc<TenantRegistry>,
        classifier: StatementClassifier,
        guardrails: GuardrailsConfig,
        schema: SchemaConfig,
    ) -> Self {
        Self {
            registry,
            classifier,
            guardrails,
            schema,
            history: HistoryConfig {
                enabled: false,
                max_entries: None,
            },
        }
    }

    /// Append every successful statement to the tenant's history, on the
    /// same handle turn that ran it.
    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }

    pub fn classifier(&self) -> &StatementClassifier {
        &self.classifier
    }

    pub fn schema_config(&self) -> &SchemaConfig {
        &self.schema
    }

    pub fn guardrails(&self) -> &GuardrailsConfig {
        &self.guardrails
    }

    /// Execute one statement for one tenant.
    pub async fn execute(&self, tenant: &TenantId, sql: &str) -> ExecutionResult {
        let started = Instant::now();
        let result = self.try_execute(tenant, sql).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                tracing::debug!(tenant = %tenant, elapsed_ms, "Statement executed");
                result
            }
            Err(e) => {
                let kind = e.failure_kind();
                if kind.is_infrastructure() {
                    tracing::warn!(tenant = %tenant, kind = %kind, elapsed_ms, error = ?e, "Statement failed");
                } else {
                    tracing::debug!(tenant = %tenant, kind = %kind, elapsed_ms, error = %e, "Statement failed");
                }
                e.into_failure()
            }
        }
    }

    async fn try_execute(&self, tenant: &TenantId, sql: &str) -> Result<ExecutionResult, StoreError> {
        if sql.trim().is_empty() {
            return Err(StoreError::Validation("statement is empty".into()));
        }

        let verdict = self.classifier.classify(sql);
        if !verdict.allowed {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "statement is not allowed".to_string());
            return Err(StoreError::Forbidden(reason));
        }

        let mut conn = self.registry.acquire(tenant).await?;
        self.check_table_quota(&mut conn, sql).await?;

        let result = match verdict.category {
            StatementCategory::Read => self.run_read(&mut conn, sql).await?,
            StatementCategory::Write => run_write(&mut conn, sql).await?,
        };

        if self.history.enabled
            && let Err(e) = journal::record_on(&mut conn, sql, &self.history).await
        {
            tracing::warn!(tenant = %tenant, error = %e, "Failed to record statement history");
        }
        Ok(result)
    }

    /// Refuse a statement whose new tables would take the tenant past its
    /// table quota. Names that already exist are not counted.
    async fn check_table_quota(
        &self,
        conn: &mut SqliteConnection,
        sql: &str,
    ) -> Result<(), StoreError> {
        let Some(limit) = self.guardrails.max_tables_per_tenant else {
            return Ok(());
        };
        let creating = created_tables(sql);
        if creating.is_empty() {
            return Ok(());
        }

        let existing = introspect::user_tables(conn, &self.schema).await?;
        let new_tables = creating
            .iter()
            .filter(|name| !existing.iter().any(|t| t.eq_ignore_ascii_case(name)))
            .count();
        if new_tables > 0 && existing.len() + new_tables > limit {
            return Err(StoreError::ResourceExhausted(format!(
                "table limit reached: {} of {limit} tables already exist",
                existing.len()
            )));
        }
        Ok(())
    }

    async fn run_read(
        &self,
        conn: &mut SqliteConnection,
        sql: &str,
    ) -> Result<ExecutionResult, StoreError> {
        let max_rows = self.guardrails.max_result_rows;
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        let mut truncated = false;

        {
            let mut stream = (&mut *conn).fetch(sqlx::query(sql).persistent(false));
            while let Some(row) = stream.try_next().await? {
                if rows.len() >= max_rows {
                    truncated = true;
                    break;
                }
                if columns.is_none() {
                    columns = Some(value::column_names(&row));
                }
                rows.push(value::row_to_json(&row));
            }
        }

        let columns = match columns {
            Some(columns) => columns,
            None => describe_columns(conn, sql).await,
        };

        Ok(ExecutionResult::Rows {
            columns,
            rows,
            truncated,
        })
    }
}

async fn run_write(conn: &mut SqliteConnection, sql: &str) -> Result<ExecutionResult, StoreError> {
    let done = (&mut *conn)
        .execute(sqlx::query(sql).persistent(false))
        .await?;

    let keyword = leading_keyword(sql);
    let is = |verb: &str| keyword.eq_ignore_ascii_case(verb);
    let inserts = is("INSERT") || is("REPLACE");
    // the engine's change counter only moves on DML; after DDL it still
    // holds the previous statement's count
    let rows_affected = if inserts || is("UPDATE") || is("DELETE") || is("WITH") {
        done.rows_affected()
    } else {
        0
    };
    let inserted_id = (inserts && rows_affected > 0).then(|| done.last_insert_rowid());

    Ok(ExecutionResult::Mutation {
        rows_affected,
        inserted_id,
    })
}

/// Column names from the prepared statement, for reads that returned no rows.
async fn describe_columns(conn: &mut SqliteConnection, sql: &str) -> Vec<String> {
    match (&mut *conn).prepare(sql).await {
        Ok(statement) => statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Could not describe result columns");
            Vec::new()
        }
    }
}
