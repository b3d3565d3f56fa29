//! Normalized statement outcomes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One result row, keyed by column name. Column order lives in `Rows::columns`.
pub type Row = Map<String, Value>;

/// Failure taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or malformed input before reaching the store.
    Validation,
    /// Denylist match; nothing was executed.
    ForbiddenStatement,
    /// The tenant's store could not be opened.
    StorageUnavailable,
    /// The engine rejected the statement.
    ExecutionError,
    /// Handle budget or a configured quota was exhausted.
    ResourceExhausted,
}

impl FailureKind {
    /// Whether this failure points at infrastructure stress rather than user input.
    pub fn is_infrastructure(self) -> bool {
        matches!(
            self,
            FailureKind::StorageUnavailable | FailureKind::ResourceExhausted
        )
    }

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::ForbiddenStatement => "forbidden_statement",
            FailureKind::StorageUnavailable => "storage_unavailable",
            FailureKind::ExecutionError => "execution_error",
            FailureKind::ResourceExhausted => "resource_exhausted",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of executing one statement for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Rows returned by a read statement.
    Rows {
        columns: Vec<String>,
        rows: Vec<Row>,
        /// Set when the row cap cut the result short.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        truncated: bool,
    },
    /// Outcome of a write statement.
    Mutation {
        rows_affected: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inserted_id: Option<i64>,
    },
    /// Structured failure; never a panic.
    Failure { error: FailureKind, message: String },
}

impl ExecutionResult {
    /// Build a failure result.
    pub fn failure(error: FailureKind, message: impl Into<String>) -> Self {
        ExecutionResult::Failure {
            error,
            message: message.into(),
        }
    }

    /// Whether this is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure { .. })
    }

    /// The failure kind, if this is a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionResult::Failure { error, .. } => Some(*error),
            _ => None,
        }
    }
}
