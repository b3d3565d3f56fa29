//! # sandql-server
//!
//! HTTP surface over [`SandqlService`](sandql_store::SandqlService).
//!
//! | Method | Path | Body / query | Response |
//! |--------|------|--------------|----------|
//! | `GET` | `/healthz` | | service status and handle counts |
//! | `POST` | `/query` | `{ "sql": "..." }` | `ExecutionResult` |
//! | `GET` | `/schema` | | `SchemaDescription` |
//! | `POST` | `/schema/apply` | `{ "schema": ..., "seed_rows": ... }` | `ExecutionResult` |
//! | `GET` | `/history` | `?limit=N` | history entries, newest first |
//! | `DELETE` | `/history` | | `{ "removed": N }` |
//! | `GET` | `/saved` | | saved queries |
//! | `POST` | `/saved` | `{ "title": "...", "sql": "..." }` | the saved query |
//! | `DELETE` | `/saved/{id}` | | `204` or `404` |
//!
//! The tenant comes from a request header (`x-tenant-id` by default), set by
//! whatever authenticates the caller in front of this service.
//!
//! Failures keep the `ExecutionResult` failure shape and map to statuses:
//! `validation` → 400, `forbidden_statement` → 403, `execution_error` → 422,
//! `resource_exhausted` and `storage_unavailable` → 503.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use sandql_core::SandqlConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Serve until Ctrl-C, then close idle tenant stores.
pub async fn run(config: SandqlConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::init(&config)?);
    let reaper = state.service.start_reaper();

    let app = create_router(Arc::clone(&state)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        addr = %config.server.bind,
        tenant_header = %state.tenant_header,
        "sandql-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.abort();
    state.service.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
