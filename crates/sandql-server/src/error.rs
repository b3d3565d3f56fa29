//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sandql_core::{ExecutionResult, FailureKind};
use sandql_store::StoreError;
use thiserror::Error;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Missing tenant header, malformed body or query string.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),
}

/// HTTP status for a failure kind.
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::ForbiddenStatement => StatusCode::FORBIDDEN,
        FailureKind::ExecutionError => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::ResourceExhausted | FailureKind::StorageUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Status and body for a statement outcome; successes are `200 OK`.
pub fn result_response(result: ExecutionResult) -> Response {
    let status = result.failure_kind().map_or(StatusCode::OK, status_for);
    (status, Json(result)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(e) => result_response(e.into_failure()),
            ApiError::Validation(message) => {
                result_response(ExecutionResult::failure(FailureKind::Validation, message))
            }
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "kind": "failure", "error": "not_found", "message": message })),
            )
                .into_response(),
        }
    }
}
