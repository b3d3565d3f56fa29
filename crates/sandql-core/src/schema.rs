//! Schema descriptions for tenant-authored tables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Seed rows for `apply_schema`, keyed by table name.
pub type SeedRows = BTreeMap<String, Vec<Map<String, Value>>>;

const DEFAULT_PREFIX: &str = "DEFAULT ";

/// One column of a tenant table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Type as declared in DDL (may be empty; SQLite allows untyped columns).
    #[serde(default)]
    pub declared_type: String,

    /// Stable summary such as `PRIMARY KEY, NOT NULL, DEFAULT 0`.
    #[serde(default)]
    pub constraints: String,
}

impl ColumnDescriptor {
    /// Create a descriptor with no constraints.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            constraints: String::new(),
        }
    }

    /// Set the constraint summary.
    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    /// Build the summary from its three flags.
    ///
    /// Parts appear in a fixed order so equal schemas always render equal text.
    pub fn summarize(primary_key: bool, not_null: bool, default: Option<&str>) -> String {
        let mut parts = Vec::new();
        if primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if not_null {
            parts.push("NOT NULL".to_string());
        }
        if let Some(default) = default {
            parts.push(format!("DEFAULT {default}"));
        }
        parts.join(", ")
    }

    /// Whether the summary marks this column as a primary key.
    pub fn is_primary_key(&self) -> bool {
        self.flags().contains("PRIMARY KEY")
    }

    /// Whether the summary marks this column NOT NULL.
    pub fn is_not_null(&self) -> bool {
        self.flags().contains("NOT NULL")
    }

    /// The default expression, if the summary carries one.
    ///
    /// `DEFAULT` is always the last part, so everything after it belongs to
    /// the expression even when it contains commas.
    pub fn default_value(&self) -> Option<&str> {
        self.constraints
            .find(DEFAULT_PREFIX)
            .map(|idx| &self.constraints[idx + DEFAULT_PREFIX.len()..])
    }

    /// The part of the summary before any default expression.
    fn flags(&self) -> &str {
        match self.constraints.find(DEFAULT_PREFIX) {
            Some(idx) => &self.constraints[..idx],
            None => &self.constraints,
        }
    }
}

/// Table name → ordered columns, for tables the tenant authored.
///
/// Backed by a `BTreeMap` so two descriptions of the same schema compare and
/// serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDescription {
    pub tables: BTreeMap<String, Vec<ColumnDescriptor>>,
}

impl SchemaDescription {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table.
    pub fn insert_table(&mut self, name: impl Into<String>, columns: Vec<ColumnDescriptor>) {
        self.tables.insert(name.into(), columns);
    }

    /// Builder-style variant of [`insert_table`](Self::insert_table).
    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        self.insert_table(name, columns);
        self
    }

    /// Columns of a table.
    pub fn table(&self, name: &str) -> Option<&[ColumnDescriptor]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Whether every table and column of `other` also appears here.
    pub fn covers(&self, other: &SchemaDescription) -> bool {
        other.tables.iter().all(|(table, columns)| {
            self.tables.get(table).is_some_and(|mine| {
                columns
                    .iter()
                    .all(|col| mine.iter().any(|c| c.name == col.name))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_is_stable() {
        assert_eq!(
            ColumnDescriptor::summarize(true, true, Some("0")),
            "PRIMARY KEY, NOT NULL, DEFAULT 0"
        );
        assert_eq!(ColumnDescriptor::summarize(false, false, None), "");
        assert_eq!(
            ColumnDescriptor::summarize(false, true, None),
            "NOT NULL"
        );
    }

    #[test]
    fn test_summary_accessors() {
        let col = ColumnDescriptor::new("n", "INTEGER")
            .with_constraints(ColumnDescriptor::summarize(false, true, Some("'x, y'")));
        assert!(!col.is_primary_key());
        assert!(col.is_not_null());
        assert_eq!(col.default_value(), Some("'x, y'"));
    }

    #[test]
    fn test_covers() {
        let applied = SchemaDescription::new()
            .with_table("t", vec![ColumnDescriptor::new("id", "INTEGER")]);
        let live = SchemaDescription::new()
            .with_table(
                "t",
                vec![
                    ColumnDescriptor::new("id", "INTEGER"),
                    ColumnDescriptor::new("v", "TEXT"),
                ],
            )
            .with_table("u", vec![ColumnDescriptor::new("id", "INTEGER")]);

        assert!(live.covers(&applied));
        assert!(!applied.covers(&live));
    }

    #[test]
    fn test_deserializes_from_plain_map() {
        let yaml = "t:\n  - name: id\n    declared_type: INTEGER\n    constraints: PRIMARY KEY\n";
        let schema: SchemaDescription = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.table("t").unwrap()[0].name, "id");
        assert!(schema.table("t").unwrap()[0].is_primary_key());
    }
}
