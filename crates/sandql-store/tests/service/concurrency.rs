//! Same-tenant serialization and cross-tenant parallelism.

use super::common::*;
use futures::future::join_all;
use pretty_assertions::assert_eq;
use sandql_core::{ColumnDescriptor, SchemaDescription, TenantId};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_are_not_lost() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(id INTEGER PRIMARY KEY, n INTEGER)")
        .await;

    const N: usize = 40;
    let tasks = (0..N).map(|n| {
        let service = ctx.service.clone();
        tokio::spawn(async move {
            service
                .execute_query("u1", &format!("INSERT INTO t(n) VALUES ({n})"))
                .await
        })
    });
    for result in join_all(tasks).await {
        let result = result.unwrap();
        assert!(!result.is_failure(), "{result:?}");
    }

    assert_eq!(ctx.count("u1", "t").await, N as i64);
    let (_, rows) = ctx.select("u1", "SELECT COUNT(DISTINCT n) AS d FROM t").await;
    assert_eq!(rows[0]["d"].as_i64(), Some(N as i64));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_tenant_runs_in_submission_order() {
    let ctx = TestContext::new();
    ctx.exec_ok("u1", "CREATE TABLE t(id INTEGER PRIMARY KEY, n INTEGER)")
        .await;
    let u1 = TenantId::new("u1").unwrap();

    let held = ctx.service.registry().acquire(&u1).await.unwrap();
    let mut tasks = Vec::new();
    for n in 0..5 {
        let service = ctx.service.clone();
        tasks.push(tokio::spawn(async move {
            service
                .execute_query("u1", &format!("INSERT INTO t(n) VALUES ({n})"))
                .await
        }));
        // let each statement queue up before the next is submitted
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
    drop(held);

    for task in tasks {
        assert!(!task.await.unwrap().is_failure());
    }
    let (_, rows) = ctx.select("u1", "SELECT n FROM t ORDER BY id").await;
    let order: Vec<i64> = rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_busy_tenant_does_not_block_others() {
    let ctx = TestContext::new();
    let u1 = TenantId::new("u1").unwrap();
    let _held = ctx.service.registry().acquire(&u1).await.unwrap();

    let other = tokio::time::timeout(
        Duration::from_secs(1),
        ctx.service.execute_query("u2", "CREATE TABLE t(v)"),
    )
    .await
    .expect("u2 should not wait on u1");
    assert!(!other.is_failure());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_tenants_in_parallel() {
    let ctx = TestContext::with_registry(small_registry(4));

    let tasks = (0..12).map(|n| {
        let service = ctx.service.clone();
        tokio::spawn(async move {
            let tenant = format!("tenant-{n}");
            let created = service.execute_query(&tenant, "CREATE TABLE t(v)").await;
            let inserted = service
                .execute_query(&tenant, &format!("INSERT INTO t VALUES ({n})"))
                .await;
            (created, inserted)
        })
    });
    for outcome in join_all(tasks).await {
        let (created, inserted) = outcome.unwrap();
        assert!(!created.is_failure(), "{created:?}");
        assert!(!inserted.is_failure(), "{inserted:?}");
    }

    let stats = ctx.service.registry().stats();
    assert!(stats.open_handles <= 4);
    assert_eq!(stats.in_use, 0);
    for n in 0..12 {
        assert_eq!(ctx.count(&format!("tenant-{n}"), "t").await, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_every_operation_runs_on_spawned_tasks() {
    let ctx = TestContext::new();
    let service = ctx.service.clone();
    let task = tokio::spawn(async move {
        let schema = SchemaDescription::new().with_table(
            "items",
            vec![ColumnDescriptor::new("id", "INTEGER").with_constraints("PRIMARY KEY")],
        );
        assert!(!service.apply_schema("u1", &schema, None).await.is_failure());
        assert!(!service.execute_query("u1", "SELECT * FROM items").await.is_failure());
        let described = service.describe_schema("u1").await.unwrap();
        let saved = service.save_query("u1", "items", "SELECT * FROM items").await.unwrap();
        let listed = service.list_saved("u1").await.unwrap();
        let history = service.list_history("u1", None).await.unwrap();
        assert!(service.delete_saved("u1", saved.id).await.unwrap());
        service.clear_history("u1").await.unwrap();
        (described, listed.len(), history.len())
    });

    let (described, saved, history) = task.await.unwrap();
    assert_eq!(described.table_names().collect::<Vec<_>>(), vec!["items"]);
    assert_eq!(saved, 1);
    assert_eq!(history, 1);
}
