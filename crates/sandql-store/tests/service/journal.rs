//! History and saved queries through the service.

use super::common::*;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_successful_statements_are_recorded() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(v)").await;
    ctx.exec_ok("u1", "INSERT INTO t VALUES (1)").await;
    // failures and rejections are not recorded
    ctx.service.execute_query("u1", "SELECT * FROM nope").await;
    ctx.service.execute_query("u1", "DROP TABLE t").await;

    let history = ctx.service.list_history("u1", None).await.unwrap();
    let statements: Vec<_> = history.iter().map(|h| h.statement.as_str()).collect();
    assert_eq!(statements, vec!["INSERT INTO t VALUES (1)", "CREATE TABLE t(v)"]);
    assert!(history[0].executed_at >= history[1].executed_at);

    assert!(ctx.service.list_history("u2", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_can_be_disabled() {
    let ctx = TestContext::with_config(|config| config.history.enabled = false);
    ctx.exec_ok("u1", "CREATE TABLE t(v)").await;
    assert!(ctx.service.list_history("u1", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_history() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "SELECT 1").await;
    assert_eq!(ctx.service.clear_history("u1").await.unwrap(), 1);
    assert!(ctx.service.list_history("u1", Some(10)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_saved_queries_are_per_tenant() {
    let ctx = TestContext::new();
    let saved = ctx
        .service
        .save_query("u1", "everything", "SELECT * FROM t")
        .await
        .unwrap();

    assert_eq!(ctx.service.list_saved("u1").await.unwrap(), vec![saved.clone()]);
    assert!(ctx.service.list_saved("u2").await.unwrap().is_empty());
    assert!(!ctx.service.delete_saved("u2", saved.id).await.unwrap());
    assert!(ctx.service.delete_saved("u1", saved.id).await.unwrap());
    assert!(ctx.service.list_saved("u1").await.unwrap().is_empty());
}
