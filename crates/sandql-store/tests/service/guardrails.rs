//! Denylist fast-reject and failure containment.

use super::common::*;
use pretty_assertions::assert_eq;
use sandql_core::{ExecutionResult, FailureKind, TenantId};
use serde_json::json;

#[tokio::test]
async fn test_forbidden_statements_never_open_a_handle() {
    let ctx = TestContext::new();
    let statements = [
        "drop table users;",
        "SELECT * FROM t WHERE x = 'DROP'",
        "DeLeTe FROM t",
        "select * from (select 1 as revoke) s",
        "TRUNCATE t",
        "ALTER TABLE t RENAME TO u",
    ];

    for sql in statements {
        let result = ctx.service.execute_query("fresh", sql).await;
        assert_eq!(
            result.failure_kind(),
            Some(FailureKind::ForbiddenStatement),
            "{sql:?}"
        );
    }

    let fresh = TenantId::new("fresh").unwrap();
    assert!(!ctx.service.registry().is_open(&fresh));
    assert!(!ctx.service.registry().storage().exists(&fresh));
    assert_eq!(ctx.service.registry().stats().open_handles, 0);
}

#[tokio::test]
async fn test_scenario_create_insert_select() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(id INTEGER PRIMARY KEY, v TEXT)")
        .await;
    let inserted = ctx.exec_ok("u1", "INSERT INTO t(v) VALUES ('a')").await;
    assert_eq!(
        inserted,
        ExecutionResult::Mutation {
            rows_affected: 1,
            inserted_id: Some(1)
        }
    );

    let (columns, rows) = ctx.select("u1", "SELECT * FROM t").await;
    assert_eq!(columns, vec!["id", "v"]);
    assert_eq!(json!(rows), json!([{"id": 1, "v": "a"}]));

    // a rejected DELETE leaves the data untouched
    let rejected = ctx.service.execute_query("u1", "DELETE FROM t").await;
    assert_eq!(rejected.failure_kind(), Some(FailureKind::ForbiddenStatement));
    let (_, rows) = ctx.select("u1", "SELECT * FROM t").await;
    assert_eq!(json!(rows), json!([{"id": 1, "v": "a"}]));
}

#[tokio::test]
async fn test_empty_table_select_returns_columns() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(id INTEGER PRIMARY KEY, v TEXT)")
        .await;

    let result = ctx.service.execute_query("u1", "SELECT * FROM t").await;
    assert_eq!(
        result,
        ExecutionResult::Rows {
            columns: vec!["id".to_string(), "v".to_string()],
            rows: vec![],
            truncated: false
        }
    );
}

#[tokio::test]
async fn test_bad_statement_does_not_affect_others() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(v INTEGER NOT NULL)").await;
    ctx.exec_ok("u2", "CREATE TABLE t(v INTEGER NOT NULL)").await;

    let broken = ctx.service.execute_query("u1", "INSERT INTO t VALUES (NULL)").await;
    match broken {
        ExecutionResult::Failure { error, message } => {
            assert_eq!(error, FailureKind::ExecutionError);
            assert!(message.contains("NOT NULL"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    let garbage = ctx.service.execute_query("u1", "SELEC oops").await;
    assert_eq!(garbage.failure_kind(), Some(FailureKind::ExecutionError));

    ctx.exec_ok("u1", "INSERT INTO t VALUES (1)").await;
    ctx.exec_ok("u2", "INSERT INTO t VALUES (2)").await;
    assert_eq!(ctx.count("u1", "t").await, 1);
    assert_eq!(ctx.count("u2", "t").await, 1);
}

#[tokio::test]
async fn test_parsed_mode_allows_keywords_in_literals() {
    let ctx = TestContext::with_config(|config| {
        config.guardrails.classifier_mode = sandql_core::ClassifierMode::Parsed;
    });
    ctx.exec_ok("u1", "CREATE TABLE t(x TEXT)").await;
    ctx.exec_ok("u1", "INSERT INTO t VALUES ('DROP')").await;

    let (_, rows) = ctx.select("u1", "SELECT * FROM t WHERE x = 'DROP'").await;
    assert_eq!(rows.len(), 1);

    let rejected = ctx.service.execute_query("u1", "DROP TABLE t").await;
    assert_eq!(rejected.failure_kind(), Some(FailureKind::ForbiddenStatement));
}
