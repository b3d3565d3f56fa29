//! CLI command implementations for sandql.

pub mod apply;
pub mod journal;
pub mod query;
pub mod serve;
