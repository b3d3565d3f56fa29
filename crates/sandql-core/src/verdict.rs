//! Classifier verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse statement category used to pick the execution path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementCategory {
    /// Statement starts with `SELECT`; returns rows.
    Read,
    /// Everything else; reports affected rows.
    Write,
}

impl fmt::Display for StatementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementCategory::Read => f.write_str("READ"),
            StatementCategory::Write => f.write_str("WRITE"),
        }
    }
}

/// Outcome of classifying one SQL text. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementVerdict {
    pub category: StatementCategory,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatementVerdict {
    /// An allowed verdict.
    pub fn allow(category: StatementCategory) -> Self {
        Self {
            category,
            allowed: true,
            reason: None,
        }
    }

    /// A rejected verdict with a human-readable reason.
    pub fn deny(category: StatementCategory, reason: impl Into<String>) -> Self {
        Self {
            category,
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
