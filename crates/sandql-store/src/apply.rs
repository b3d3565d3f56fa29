//! Schema application for import tooling.
//!
//! Turns a [`SchemaDescription`] plus optional seed rows into
//! `CREATE TABLE IF NOT EXISTS` and parameterised `INSERT` statements, then
//! runs them as one transaction on the tenant's handle. Every generated
//! statement passes the classifier before anything runs.

use crate::error::StoreError;
use crate::executor::QueryExecutor;
use crate::introspect;
use crate::value;
use sandql_core::{ColumnDescriptor, ExecutionResult, SchemaDescription, SeedRows, TenantId};
use serde_json::Value;
use sqlx::{Connection, Executor};

/// One seed row ready to bind.
#[derive(Debug)]
struct SeedInsert {
    table: String,
    sql: String,
    values: Vec<Value>,
}

#[derive(Debug, Default)]
struct ApplyPlan {
    /// (table, DDL) in table-name order.
    creates: Vec<(String, String)>,
    inserts: Vec<SeedInsert>,
}

impl QueryExecutor {
    /// Create the described tables (when missing) and insert seed rows.
    ///
    /// Succeeds with `Mutation { rows_affected }` counting seeded rows. On the
    /// first failure everything is rolled back.
    pub async fn apply_schema(
        &self,
        tenant: &TenantId,
        schema: &SchemaDescription,
        seed_rows: Option<&SeedRows>,
    ) -> ExecutionResult {
        match self.try_apply(tenant, schema, seed_rows).await {
            Ok(result) => result,
            Err(e) => {
                let kind = e.failure_kind();
                if kind.is_infrastructure() {
                    tracing::warn!(tenant = %tenant, kind = %kind, error = ?e, "Schema application failed");
                } else {
                    tracing::info!(tenant = %tenant, kind = %kind, error = %e, "Schema application rejected");
                }
                e.into_failure()
            }
        }
    }

    async fn try_apply(
        &self,
        tenant: &TenantId,
        schema: &SchemaDescription,
        seed_rows: Option<&SeedRows>,
    ) -> Result<ExecutionResult, StoreError> {
        let plan = self.plan(schema, seed_rows)?;

        for statement in plan
            .creates
            .iter()
            .map(|(_, sql)| sql)
            .chain(plan.inserts.iter().map(|insert| &insert.sql))
        {
            let verdict = self.classifier().classify(statement);
            if !verdict.allowed {
                return Err(StoreError::Forbidden(
                    verdict
                        .reason
                        .unwrap_or_else(|| "generated statement is not allowed".to_string()),
                ));
            }
        }

        let mut conn = self.registry().acquire(tenant).await?;
        let existing = introspect::user_tables(&mut conn, self.schema_config()).await?;
        if let Some(limit) = self.guardrails().max_tables_per_tenant {
            let new_tables = plan
                .creates
                .iter()
                .filter(|(table, _)| !existing.iter().any(|t| t.eq_ignore_ascii_case(table)))
                .count();
            if existing.len() + new_tables > limit {
                return Err(StoreError::ResourceExhausted(format!(
                    "table limit reached: applying would exceed {limit} tables"
                )));
            }
        }

        let mut tx = conn.begin().await?;
        for (table, ddl) in &plan.creates {
            (&mut *tx)
                .execute(sqlx::query(ddl).persistent(false))
                .await
                .map_err(|e| {
                    StoreError::Execution(format!(
                        "creating table {table}: {}",
                        crate::error::engine_message(&e)
                    ))
                })?;
        }

        let mut seeded = 0;
        for insert in &plan.inserts {
            let mut query = sqlx::query(&insert.sql);
            for value in &insert.values {
                query = value::bind_json(query, value);
            }
            seeded += (&mut *tx)
                .execute(query)
                .await
                .map_err(|e| {
                    StoreError::Execution(format!(
                        "seeding table {}: {}",
                        insert.table,
                        crate::error::engine_message(&e)
                    ))
                })?
                .rows_affected();
        }
        tx.commit().await?;

        tracing::info!(
            tenant = %tenant,
            tables = plan.creates.len(),
            seeded,
            "Applied schema"
        );
        Ok(ExecutionResult::Mutation {
            rows_affected: seeded,
            inserted_id: None,
        })
    }

    fn plan(
        &self,
        schema: &SchemaDescription,
        seed_rows: Option<&SeedRows>,
    ) -> Result<ApplyPlan, StoreError> {
        let seed_count = seed_rows.map_or(0, |seeds| seeds.values().map(Vec::len).sum());
        if schema.is_empty() && seed_count == 0 {
            return Err(StoreError::Validation("schema has no tables".into()));
        }

        let mut plan = ApplyPlan::default();
        for (table, columns) in &schema.tables {
            self.check_table_name(table)?;
            plan.creates.push((table.clone(), create_table_sql(table, columns)?));
        }

        for (table, rows) in seed_rows.into_iter().flatten() {
            self.check_table_name(table)?;
            for row in rows {
                plan.inserts.push(insert_sql(table, row)?);
            }
        }
        Ok(plan)
    }

    fn check_table_name(&self, table: &str) -> Result<(), StoreError> {
        if table.trim().is_empty() {
            return Err(StoreError::Validation("table name is empty".into()));
        }
        if self.schema_config().is_reserved(table) {
            return Err(StoreError::Validation(format!(
                "table name {table} is reserved"
            )));
        }
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn check_declared_type(column: &ColumnDescriptor) -> Result<(), StoreError> {
    let ok = column
        .declared_type
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ','));
    if ok {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "column {} has an invalid type: {}",
            column.name, column.declared_type
        )))
    }
}

fn create_table_sql(table: &str, columns: &[ColumnDescriptor]) -> Result<String, StoreError> {
    if columns.is_empty() {
        return Err(StoreError::Validation(format!("table {table} has no columns")));
    }

    let primary: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.is_primary_key()).collect();
    let composite = primary.len() > 1;

    let mut defs = Vec::with_capacity(columns.len() + 1);
    for column in columns {
        if column.name.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "table {table} has a column with no name"
            )));
        }
        check_declared_type(column)?;

        let mut def = quote_ident(&column.name);
        if !column.declared_type.trim().is_empty() {
            def.push(' ');
            def.push_str(column.declared_type.trim());
        }
        if column.is_primary_key() && !composite {
            def.push_str(" PRIMARY KEY");
        }
        if column.is_not_null() {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = column.default_value() {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        defs.push(def);
    }

    if composite {
        let keys: Vec<String> = primary.iter().map(|c| quote_ident(&c.name)).collect();
        defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        defs.join(", ")
    ))
}

fn insert_sql(table: &str, row: &serde_json::Map<String, Value>) -> Result<SeedInsert, StoreError> {
    if row.is_empty() {
        return Ok(SeedInsert {
            table: table.to_string(),
            sql: format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table)),
            values: Vec::new(),
        });
    }

    let mut columns = Vec::with_capacity(row.len());
    let mut placeholders = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (idx, (column, value)) in row.iter().enumerate() {
        if column.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "seed row for {table} has an empty column name"
            )));
        }
        columns.push(quote_ident(column));
        placeholders.push(format!("?{}", idx + 1));
        values.push(value.clone());
    }

    Ok(SeedInsert {
        table: table.to_string(),
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.join(", "),
            placeholders.join(", ")
        ),
        values,
    })
}
