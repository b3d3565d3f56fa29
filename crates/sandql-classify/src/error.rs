//! Error types for the classifier crate.

use thiserror::Error;

/// Errors raised while building a classifier.
///
/// Classification itself never fails; it always yields a verdict.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A denylist entry is empty or not a plain word.
    #[error("invalid denylist keyword: {0:?}")]
    InvalidKeyword(String),

    /// The keyword pattern could not be compiled.
    #[error("failed to build keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// SQL parsing failed.
    #[error("failed to parse SQL: {0}")]
    ParseError(String),
}
