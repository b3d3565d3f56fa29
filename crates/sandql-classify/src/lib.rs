//! # sandql-classify
//!
//! Syntactic pre-filter for tenant-supplied SQL.
//!
//! Every statement is classified before it reaches a tenant store:
//!
//! | Check | Rule |
//! |-------|------|
//! | Category | `READ` when the trimmed text starts with `SELECT`, `WRITE` otherwise |
//! | Denylist | whole-word, case-insensitive match of `DROP`, `TRUNCATE`, `DELETE`, `ALTER`, `MODIFY`, `RENAME`, `REMOVE`, `GRANT`, `REVOKE` anywhere in the text |
//! | Store escape | `ATTACH`, `DETACH` and `VACUUM ... INTO` are rejected in every mode, whatever the denylist |
//!
//! The keyword scan deliberately over-approximates: a keyword inside a string
//! literal or a subquery still rejects the statement. [`ClassifierMode::Parsed`]
//! trades that for a verb check on the parsed statement, looking through `WITH`
//! clauses and set operations to the statement that actually runs.
//!
//! This is not a security boundary against read-only exfiltration or
//! resource exhaustion; it only keeps destructive commands away from stores.
//!
//! [`ClassifierMode::Parsed`]: sandql_core::ClassifierMode::Parsed

pub mod classifier;
pub mod error;
pub mod parser;

pub use classifier::{category_of, leading_keyword, StatementClassifier};
pub use error::ClassifyError;
pub use parser::SqlAnalyzer;
