//! Per-tenant statement history and saved queries.
//!
//! Both live as internal tables inside the tenant's own store, so they share
//! its isolation and lifetime. The table names are reserved: introspection
//! hides them and schema application refuses to touch them.
//!
//! Journal statements are fixed and parameterised. They go through the
//! registry like any other operation but skip the classifier.

use crate::error::StoreError;
use crate::registry::TenantRegistry;
use chrono::{DateTime, Utc};
use sandql_core::{HistoryConfig, TenantId};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnection;
use sqlx::{Executor, FromRow};
use std::sync::Arc;

/// Creates the internal tables. Runs on every open; safe to repeat.
pub const BOOTSTRAP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY,
    statement TEXT NOT NULL,
    executed_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS saved_queries (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    statement TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// A statement that executed successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub statement: String,
    pub executed_at: DateTime<Utc>,
}

/// A named statement kept for reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SavedQuery {
    pub id: i64,
    pub title: String,
    pub statement: String,
    pub created_at: DateTime<Utc>,
}

/// History and saved-query access for all tenants.
#[derive(Clone)]
pub struct TenantJournal {
    registry: Arc<TenantRegistry>,
    config: HistoryConfig,
}

impl TenantJournal {
    pub fn new(registry: Arc<TenantRegistry>, config: HistoryConfig) -> Self {
        Self { registry, config }
    }

    /// Append a statement to the tenant's history, trimming the oldest
    /// entries past `max_entries`. No-op when history is disabled.
    pub async fn record(&self, tenant: &TenantId, statement: &str) -> Result<(), StoreError> {
        if !self.config.enabled {
            return Ok(());
        }
        let mut conn = self.registry.acquire(tenant).await?;
        let trimmed = record_on(&mut conn, statement, &self.config).await?;
        if trimmed > 0 {
            tracing::debug!(tenant = %tenant, trimmed, "Trimmed statement history");
        }
        Ok(())
    }

    /// Most recent entries first.
    pub async fn list_history(
        &self,
        tenant: &TenantId,
        limit: Option<u32>,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut conn = self.registry.acquire(tenant).await?;
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = (&mut *conn)
            .fetch_all(
                sqlx::query(
                    "SELECT id, statement, executed_at FROM history ORDER BY id DESC LIMIT ?1",
                )
                .bind(limit),
            )
            .await?;
        let entries = rows
            .iter()
            .map(HistoryEntry::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Remove every history entry. Returns how many were removed.
    pub async fn clear_history(&self, tenant: &TenantId) -> Result<u64, StoreError> {
        let mut conn = self.registry.acquire(tenant).await?;
        let removed = (&mut *conn)
            .execute(sqlx::query("DELETE FROM history"))
            .await?
            .rows_affected();
        tracing::info!(tenant = %tenant, removed, "Cleared statement history");
        Ok(removed)
    }

    pub async fn save_query(
        &self,
        tenant: &TenantId,
        title: &str,
        statement: &str,
    ) -> Result<SavedQuery, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::Validation("saved query title is empty".into()));
        }
        if statement.trim().is_empty() {
            return Err(StoreError::Validation("saved query statement is empty".into()));
        }

        let mut conn = self.registry.acquire(tenant).await?;
        let row = (&mut *conn)
            .fetch_one(
                sqlx::query(
                    "INSERT INTO saved_queries (title, statement, created_at) VALUES (?1, ?2, ?3) \
                     RETURNING id, title, statement, created_at",
                )
                .bind(title.trim())
                .bind(statement)
                .bind(Utc::now()),
            )
            .await?;
        Ok(SavedQuery::from_row(&row)?)
    }

    /// Newest first.
    pub async fn list_saved(&self, tenant: &TenantId) -> Result<Vec<SavedQuery>, StoreError> {
        let mut conn = self.registry.acquire(tenant).await?;
        let rows = (&mut *conn)
            .fetch_all(sqlx::query(
                "SELECT id, title, statement, created_at FROM saved_queries ORDER BY id DESC",
            ))
            .await?;
        let saved = rows
            .iter()
            .map(SavedQuery::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(saved)
    }

    /// Returns whether a saved query with that id existed.
    pub async fn delete_saved(&self, tenant: &TenantId, id: i64) -> Result<bool, StoreError> {
        let mut conn = self.registry.acquire(tenant).await?;
        let removed = (&mut *conn)
            .execute(sqlx::query("DELETE FROM saved_queries WHERE id = ?1").bind(id))
            .await?
            .rows_affected();
        Ok(removed > 0)
    }
}

/// Insert one history entry on an already-held handle and apply the
/// retention cap. Returns how many old entries were trimmed.
pub(crate) async fn record_on(
    conn: &mut SqliteConnection,
    statement: &str,
    config: &HistoryConfig,
) -> Result<u64, sqlx::Error> {
    (&mut *conn)
        .execute(
            sqlx::query("INSERT INTO history (statement, executed_at) VALUES (?1, ?2)")
                .bind(statement)
                .bind(Utc::now()),
        )
        .await?;

    let Some(max) = config.max_entries else {
        return Ok(0);
    };
    let trimmed = (&mut *conn)
        .execute(
            sqlx::query(
                "DELETE FROM history WHERE id NOT IN \
                 (SELECT id FROM history ORDER BY id DESC LIMIT ?1)",
            )
            .bind(i64::try_from(max).unwrap_or(i64::MAX)),
        )
        .await?
        .rows_affected();
    Ok(trimmed)
}
