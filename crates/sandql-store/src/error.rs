//! Error types for the store crate.

use sandql_core::{ExecutionResult, FailureKind, TenantId, TenantIdError};
use thiserror::Error;

/// Boxed source error kept for logging only.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the registry, executor internals, introspection and the journal.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Denylist match.
    #[error("{0}")]
    Forbidden(String),

    /// The tenant's store could not be opened.
    ///
    /// The display text is deliberately generic; engine detail stays in `source`.
    #[error("tenant store is temporarily unavailable")]
    StorageUnavailable {
        tenant: TenantId,
        #[source]
        source: BoxError,
    },

    /// Handle budget exhausted or a quota hit.
    #[error("{0}")]
    ResourceExhausted(String),

    /// The engine rejected the statement.
    #[error("{0}")]
    Execution(String),

    /// Column enumeration failed for a table.
    #[error("failed to describe table {table}: {message}")]
    Introspection { table: String, message: String },
}

impl StoreError {
    /// Wrap an open/initialization failure.
    pub fn unavailable(tenant: &TenantId, source: impl Into<BoxError>) -> Self {
        StoreError::StorageUnavailable {
            tenant: tenant.clone(),
            source: source.into(),
        }
    }

    /// Failure kind surfaced to callers.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            StoreError::Validation(_) => FailureKind::Validation,
            StoreError::Forbidden(_) => FailureKind::ForbiddenStatement,
            StoreError::StorageUnavailable { .. } => FailureKind::StorageUnavailable,
            StoreError::ResourceExhausted(_) => FailureKind::ResourceExhausted,
            StoreError::Execution(_) | StoreError::Introspection { .. } => {
                FailureKind::ExecutionError
            }
        }
    }

    /// Convert into a structured failure result.
    pub fn into_failure(self) -> ExecutionResult {
        ExecutionResult::failure(self.failure_kind(), self.to_string())
    }
}

impl From<TenantIdError> for StoreError {
    fn from(err: TenantIdError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Execution(engine_message(&err))
    }
}

/// The engine's own diagnostic, without sqlx's wrapper prefix.
pub(crate) fn engine_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}
