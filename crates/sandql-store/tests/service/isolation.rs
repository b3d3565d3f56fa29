//! Tenant isolation.

use super::common::*;
use pretty_assertions::assert_eq;
use sandql_core::{ExecutionResult, FailureKind};
use serde_json::json;

#[tokio::test]
async fn test_writes_are_invisible_to_other_tenants() {
    let ctx = TestContext::new();
    ctx.exec_ok("alice", "CREATE TABLE notes(id INTEGER PRIMARY KEY, body TEXT)")
        .await;
    ctx.exec_ok("alice", "INSERT INTO notes(body) VALUES ('private')")
        .await;

    // bob has no such table at all
    let result = ctx.service.execute_query("bob", "SELECT * FROM notes").await;
    assert_eq!(result.failure_kind(), Some(FailureKind::ExecutionError));
    assert!(ctx.service.describe_schema("bob").await.unwrap().is_empty());

    // same table name, separate data
    ctx.exec_ok("bob", "CREATE TABLE notes(id INTEGER PRIMARY KEY, body TEXT)")
        .await;
    assert_eq!(ctx.count("bob", "notes").await, 0);
    assert_eq!(ctx.count("alice", "notes").await, 1);
}

#[tokio::test]
async fn test_attaching_another_tenants_store_is_refused() {
    // an empty denylist must not open a way into another tenant's file
    let ctx = TestContext::with_config(|config| config.guardrails.denylist = Vec::new());
    ctx.exec_ok("alice", "CREATE TABLE notes(body TEXT)").await;
    ctx.exec_ok("alice", "INSERT INTO notes VALUES ('private')").await;

    let alice = ctx
        .service
        .registry()
        .storage()
        .path_for(&"alice".try_into().unwrap());
    for sql in [
        format!("ATTACH DATABASE '{}' AS a", alice.display()),
        "DETACH DATABASE a".to_string(),
        format!("VACUUM INTO '{}'", ctx.dir.path().join("copy.sqlite").display()),
    ] {
        let result = ctx.service.execute_query("bob", &sql).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::ForbiddenStatement), "{sql}");
    }

    assert!(!ctx.dir.path().join("copy.sqlite").exists());
    assert_eq!(ctx.count("alice", "notes").await, 1);
    assert!(ctx.service.describe_schema("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tenant_ids_with_path_characters_stay_separate() {
    let ctx = TestContext::new();
    for tenant in ["../u1", "u1", "u1/..", "user@example.com"] {
        ctx.exec_ok(tenant, "CREATE TABLE t(v TEXT)").await;
        ctx.exec_ok(tenant, &format!("INSERT INTO t VALUES ('{}')", tenant.len()))
            .await;
    }

    for tenant in ["../u1", "u1", "u1/..", "user@example.com"] {
        let (_, rows) = ctx.select(tenant, "SELECT v FROM t").await;
        assert_eq!(rows.len(), 1, "tenant {tenant}");
        assert_eq!(json!(rows[0]["v"]), json!(tenant.len().to_string()));
    }

    // every store file lives directly in the data directory
    let data_dir = ctx.dir.path().join("tenants");
    let files = std::fs::read_dir(&data_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "sqlite"))
        .count();
    assert_eq!(files, 4);
}

#[tokio::test]
async fn test_invalid_tenant_is_validation_failure() {
    let ctx = TestContext::new();
    let result = ctx.service.execute_query("", "SELECT 1").await;
    assert_eq!(result.failure_kind(), Some(FailureKind::Validation));

    let too_long = "x".repeat(200);
    let result = ctx.service.execute_query(&too_long, "SELECT 1").await;
    assert!(matches!(
        result,
        ExecutionResult::Failure {
            error: FailureKind::Validation,
            ..
        }
    ));
}

#[tokio::test]
async fn test_stores_survive_restart() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(v TEXT)").await;
    ctx.exec_ok("u1", "INSERT INTO t VALUES ('kept')").await;
    ctx.service.shutdown().await;
    assert!(!ctx.service.registry().is_open(&"u1".try_into().unwrap()));

    let (_, rows) = ctx.select("u1", "SELECT v FROM t").await;
    assert_eq!(json!(rows), json!([{"v": "kept"}]));
}
