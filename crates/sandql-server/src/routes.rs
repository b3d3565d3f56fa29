//! Route handlers.

use crate::error::{result_response, ApiError};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use sandql_core::{SchemaDescription, SeedRows, TenantId};
use sandql_store::{HistoryEntry, SavedQuery};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Build the router for all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/query", post(run_query))
        .route("/schema", get(describe_schema))
        .route("/schema/apply", post(apply_schema))
        .route("/history", get(list_history).delete(clear_history))
        .route("/saved", get(list_saved).post(save_query))
        .route("/saved/{id}", delete(delete_saved))
        .with_state(state)
}

/// Tenant id taken from the configured request header.
pub struct Tenant(pub TenantId);

impl FromRequestParts<Arc<AppState>> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = &state.tenant_header;
        let value = parts
            .headers
            .get(header)
            .ok_or_else(|| ApiError::Validation(format!("missing {header} header")))?;
        let raw = value
            .to_str()
            .map_err(|_| ApiError::Validation(format!("{header} header is not valid text")))?;
        let tenant = TenantId::new(raw.trim()).map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(Tenant(tenant))
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub schema: SchemaDescription,
    #[serde(default)]
    pub seed_rows: Option<SeedRows>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub title: String,
    pub sql: String,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.service.registry().stats();
    Json(json!({
        "ok": true,
        "service": "sandql-server",
        "version": env!("CARGO_PKG_VERSION"),
        "open_handles": stats.open_handles,
        "in_use": stats.in_use,
        "max_open_handles": stats.max_open_handles,
    }))
}

async fn run_query(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body(payload)?;
    let result = state
        .service
        .execute_query(tenant.as_str(), &request.sql)
        .await;
    Ok(result_response(result))
}

async fn describe_schema(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
) -> Result<Json<SchemaDescription>, ApiError> {
    let schema = state.service.describe_schema(tenant.as_str()).await?;
    Ok(Json(schema))
}

async fn apply_schema(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body(payload)?;
    let result = state
        .service
        .apply_schema(tenant.as_str(), &request.schema, request.seed_rows.as_ref())
        .await;
    Ok(result_response(result))
}

async fn list_history(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let entries = state
        .service
        .list_history(tenant.as_str(), params.limit)
        .await?;
    Ok(Json(entries))
}

async fn clear_history(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.service.clear_history(tenant.as_str()).await?;
    Ok(Json(json!({ "removed": removed })))
}

async fn list_saved(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
) -> Result<Json<Vec<SavedQuery>>, ApiError> {
    let saved = state.service.list_saved(tenant.as_str()).await?;
    Ok(Json(saved))
}

async fn save_query(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    let saved = state
        .service
        .save_query(tenant.as_str(), &request.title, &request.sql)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn delete_saved(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.service.delete_saved(tenant.as_str(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("saved query {id} not found")))
    }
}
