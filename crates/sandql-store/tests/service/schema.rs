//! Schema introspection and application.

use super::common::*;
use pretty_assertions::assert_eq;
use sandql_core::{ColumnDescriptor, ExecutionResult, FailureKind, SchemaDescription, SeedRows};
use serde_json::json;

fn library() -> SchemaDescription {
    SchemaDescription::new()
        .with_table(
            "authors",
            vec![
                ColumnDescriptor::new("id", "INTEGER").with_constraints("PRIMARY KEY"),
                ColumnDescriptor::new("name", "TEXT").with_constraints("NOT NULL"),
            ],
        )
        .with_table(
            "books",
            vec![
                ColumnDescriptor::new("id", "INTEGER").with_constraints("PRIMARY KEY"),
                ColumnDescriptor::new("title", "TEXT").with_constraints("NOT NULL"),
                ColumnDescriptor::new("author_id", "INTEGER"),
                ColumnDescriptor::new("stock", "INTEGER").with_constraints("NOT NULL, DEFAULT 0"),
            ],
        )
}

#[tokio::test]
async fn test_describe_twice_is_identical() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(id INTEGER PRIMARY KEY, v TEXT DEFAULT 'x')")
        .await;
    ctx.exec_ok("u1", "CREATE TABLE u(a, b REAL NOT NULL)").await;

    let first = ctx.service.describe_schema("u1").await.unwrap();
    let second = ctx.service.describe_schema("u1").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.table_names().collect::<Vec<_>>(), vec!["t", "u"]);
}

#[tokio::test]
async fn test_internal_tables_are_hidden() {
    let ctx = TestContext::new();
    // history is written as a side effect of this statement
    ctx.exec_ok("u1", "CREATE TABLE mine(v)").await;
    ctx.service.save_query("u1", "all", "SELECT * FROM mine").await.unwrap();

    let schema = ctx.service.describe_schema("u1").await.unwrap();
    assert_eq!(schema.table_names().collect::<Vec<_>>(), vec!["mine"]);
}

#[tokio::test]
async fn test_apply_then_describe_covers_applied() {
    let ctx = TestContext::new();
    let applied = library();

    let result = ctx.service.apply_schema("u1", &applied, None).await;
    assert!(!result.is_failure(), "{result:?}");

    let described = ctx.service.describe_schema("u1").await.unwrap();
    assert!(described.covers(&applied));
    assert_eq!(described, applied);
}

#[tokio::test]
async fn test_apply_with_seed_rows() {
    let ctx = TestContext::new();
    let mut seeds = SeedRows::new();
    seeds.insert(
        "authors".into(),
        vec![json!({"id": 1, "name": "Le Guin"}).as_object().unwrap().clone()],
    );
    seeds.insert(
        "books".into(),
        vec![
            json!({"title": "The Dispossessed", "author_id": 1})
                .as_object()
                .unwrap()
                .clone(),
            json!({"title": "The Lathe of Heaven", "author_id": 1, "stock": 3})
                .as_object()
                .unwrap()
                .clone(),
        ],
    );

    let result = ctx.service.apply_schema("u1", &library(), Some(&seeds)).await;
    assert_eq!(
        result,
        ExecutionResult::Mutation {
            rows_affected: 3,
            inserted_id: None
        }
    );

    let (_, rows) = ctx
        .select("u1", "SELECT title, stock FROM books ORDER BY id")
        .await;
    assert_eq!(
        json!(rows),
        json!([
            {"title": "The Dispossessed", "stock": 0},
            {"title": "The Lathe of Heaven", "stock": 3}
        ])
    );
}

#[tokio::test]
async fn test_apply_rejects_reserved_tables() {
    let ctx = TestContext::new();
    let schema = SchemaDescription::new()
        .with_table("saved_queries", vec![ColumnDescriptor::new("x", "TEXT")]);

    let result = ctx.service.apply_schema("u1", &schema, None).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::Validation));
}

#[tokio::test]
async fn test_apply_respects_table_quota() {
    let ctx = TestContext::with_config(|config| {
        config.guardrails.max_tables_per_tenant = Some(1);
    });

    let result = ctx.service.apply_schema("u1", &library(), None).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::ResourceExhausted));
    assert!(ctx.service.describe_schema("u1").await.unwrap().is_empty());
}
