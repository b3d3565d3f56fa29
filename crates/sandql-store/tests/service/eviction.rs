//! Bounded handle cache: LRU eviction, backpressure and idle sweeps.

use super::common::*;
use pretty_assertions::assert_eq;
use sandql_core::{FailureKind, RegistryConfig, TenantId};
use std::time::Duration;

fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

#[tokio::test]
async fn test_third_tenant_evicts_least_recently_used() {
    let ctx = TestContext::with_registry(small_registry(2));
    let registry = ctx.service.registry();

    ctx.exec_ok("u1", "CREATE TABLE t(v)").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    ctx.exec_ok("u2", "CREATE TABLE t(v)").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    ctx.exec_ok("u1", "INSERT INTO t VALUES (1)").await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    ctx.exec_ok("u3", "CREATE TABLE t(v)").await;

    assert!(registry.is_open(&tenant("u1")));
    assert!(!registry.is_open(&tenant("u2")));
    assert!(registry.is_open(&tenant("u3")));
    assert_eq!(registry.stats().open_handles, 2);

    // the evicted tenant reopens with its data intact
    assert_eq!(ctx.count("u2", "t").await, 0);
    assert!(registry.is_open(&tenant("u2")));
    assert_eq!(ctx.count("u1", "t").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_cache_blocks_until_release() {
    let ctx = TestContext::with_registry(small_registry(1));
    let held = ctx.service.registry().acquire(&tenant("u1")).await.unwrap();

    let waiter = {
        let service = ctx.service.clone();
        tokio::spawn(async move { service.execute_query("u2", "CREATE TABLE t(v)").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());
    assert!(!ctx.service.registry().is_open(&tenant("u2")));

    drop(held);
    let result = waiter.await.unwrap();
    assert!(!result.is_failure(), "{result:?}");
    assert!(ctx.service.registry().stats().open_handles <= 1);
}

#[tokio::test]
async fn test_sustained_exhaustion_times_out() {
    let ctx = TestContext::with_registry(RegistryConfig {
        acquire_timeout_ms: 150,
        ..small_registry(1)
    });
    let _held = ctx.service.registry().acquire(&tenant("u1")).await.unwrap();

    let result = ctx.service.execute_query("u2", "SELECT 1").await;
    assert_eq!(result.failure_kind(), Some(FailureKind::ResourceExhausted));
}

#[tokio::test]
async fn test_reaper_closes_idle_handles() {
    let ctx = TestContext::with_registry(RegistryConfig {
        idle_timeout_secs: 1,
        reap_interval_secs: 1,
        ..small_registry(8)
    });
    let reaper = ctx.service.start_reaper();

    ctx.exec_ok("u1", "CREATE TABLE t(v)").await;
    assert!(ctx.service.registry().is_open(&tenant("u1")));

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert!(!ctx.service.registry().is_open(&tenant("u1")));
    reaper.abort();

    // reopening after an idle close works
    assert_eq!(ctx.count("u1", "t").await, 0);
}
