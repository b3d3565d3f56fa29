//! Schema introspection.
//!
//! Reads the engine catalog (`sqlite_master`, `pragma_table_info`) on the
//! tenant's own handle and reports only the tables the tenant authored.

use crate::error::StoreError;
use crate::registry::TenantRegistry;
use sandql_core::{ColumnDescriptor, SchemaConfig, SchemaDescription, TenantId};
use sqlx::sqlite::SqliteConnection;
use sqlx::{Executor, Row};
use std::sync::Arc;

/// Builds [`SchemaDescription`]s of the tables a tenant created.
#[derive(Clone)]
pub struct SchemaIntrospector {
    registry: Arc<TenantRegistry>,
    schema: SchemaConfig,
}

impl SchemaIntrospector {
    pub fn new(registry: Arc<TenantRegistry>, schema: SchemaConfig) -> Self {
        Self { registry, schema }
    }

    /// Describe every tenant-authored table. Reserved application tables and
    /// engine tables are left out.
    ///
    /// All-or-nothing: if any table cannot be described the whole call fails.
    pub async fn describe(&self, tenant: &TenantId) -> Result<SchemaDescription, StoreError> {
        let mut conn = self.registry.acquire(tenant).await?;
        let description = describe_on(&mut conn, &self.schema).await?;
        tracing::debug!(tenant = %tenant, tables = description.len(), "Described tenant schema");
        Ok(description)
    }
}

/// Tenant-authored table names, sorted.
pub(crate) async fn user_tables(
    conn: &mut SqliteConnection,
    schema: &SchemaConfig,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = (&mut *conn)
        .fetch_all(sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        ))
        .await?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("name")?;
        if !schema.is_reserved(&name) {
            tables.push(name);
        }
    }
    Ok(tables)
}

pub(crate) async fn describe_on(
    conn: &mut SqliteConnection,
    schema: &SchemaConfig,
) -> Result<SchemaDescription, StoreError> {
    let mut description = SchemaDescription::new();
    for table in user_tables(conn, schema).await? {
        let columns = table_columns(conn, &table)
            .await
            .map_err(|e| StoreError::Introspection {
                table: table.clone(),
                message: crate::error::engine_message(&e),
            })?;
        description.insert_table(table, columns);
    }
    Ok(description)
}

async fn table_columns(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
    let rows = (&mut *conn)
        .fetch_all(
            sqlx::query(
                r#"
                SELECT name, type, "notnull", dflt_value, pk
                FROM pragma_table_info(?1)
                ORDER BY cid
                "#,
            )
            .bind(table),
        )
        .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("name")?;
        let declared_type: String = row.try_get("type")?;
        let not_null: i64 = row.try_get("notnull")?;
        let default: Option<String> = row.try_get("dflt_value")?;
        let pk: i64 = row.try_get("pk")?;

        let constraints = ColumnDescriptor::summarize(pk > 0, not_null != 0, default.as_deref());
        columns.push(ColumnDescriptor::new(name, declared_type).with_constraints(constraints));
    }
    Ok(columns)
}
