//! SQL parsing and root-verb analysis.

use crate::error::ClassifyError;
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

/// Parses tenant SQL with the SQLite dialect and reports what each
/// statement does at its root.
pub struct SqlAnalyzer {
    dialect: SQLiteDialect,
}

impl Clone for SqlAnalyzer {
    fn clone(&self) -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }
}

impl Default for SqlAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SqlAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SqlAnalyzer(sqlite)")
    }
}

impl SqlAnalyzer {
    /// Create a new SQL analyzer.
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Parse a SQL string into statements.
    pub fn parse(&self, sql: &str) -> Result<Vec<Statement>, ClassifyError> {
        Parser::parse_sql(&self.dialect, sql).map_err(|e| ClassifyError::ParseError(e.to_string()))
    }

    /// Get the root operation of a statement.
    pub fn get_operation(&self, stmt: &Statement) -> SqlOperation {
        match stmt {
            Statement::Query(query) => self.body_operation(&query.body),
            Statement::Insert { .. } => SqlOperation::Insert,
            Statement::Update { .. } => SqlOperation::Update,
            Statement::CreateTable { .. }
            | Statement::CreateIndex { .. }
            | Statement::CreateView { .. } => SqlOperation::Create,
            Statement::Delete { .. } => SqlOperation::Destructive("DELETE"),
            Statement::Drop { .. } => SqlOperation::Destructive("DROP"),
            Statement::Truncate { .. } => SqlOperation::Destructive("TRUNCATE"),
            Statement::AlterTable { .. } => SqlOperation::Destructive("ALTER"),
            Statement::Grant { .. } => SqlOperation::Destructive("GRANT"),
            Statement::Revoke { .. } => SqlOperation::Destructive("REVOKE"),
            _ => SqlOperation::Other,
        }
    }

    /// A query body can carry a data-modifying statement, as in
    /// `WITH x AS (...) DELETE FROM t`.
    fn body_operation(&self, body: &SetExpr) -> SqlOperation {
        match body {
            SetExpr::Insert(stmt) | SetExpr::Update(stmt) | SetExpr::Delete(stmt) => {
                self.get_operation(stmt)
            }
            SetExpr::Query(query) => self.body_operation(&query.body),
            SetExpr::SetOperation { left, right, .. } => {
                match self.body_operation(left) {
                    SqlOperation::Select => self.body_operation(right),
                    other => other,
                }
            }
            _ => SqlOperation::Select,
        }
    }

    /// Destructive root verbs found in `sql`, in statement order.
    ///
    /// Returns `Err` when the text does not parse; callers decide how to fall back.
    pub fn destructive_verbs(&self, sql: &str) -> Result<Vec<&'static str>, ClassifyError> {
        let statements = self.parse(sql)?;
        let mut verbs = Vec::new();
        for stmt in &statements {
            if let SqlOperation::Destructive(verb) = self.get_operation(stmt)
                && !verbs.contains(&verb)
            {
                verbs.push(verb);
            }
        }
        Ok(verbs)
    }
}

/// Root operation of a parsed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Create,
    /// A verb that removes or restructures data, with its keyword.
    Destructive(&'static str),
    Other,
}
