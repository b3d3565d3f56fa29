//! `sandql apply --tenant <id> <file>` - apply a schema file.
//!
//! The file is YAML or JSON, either a bare schema:
//!
//! ```yaml
//! books:
//!   - name: id
//!     declared_type: INTEGER
//!     constraints: PRIMARY KEY
//!   - name: title
//!     declared_type: TEXT
//!     constraints: NOT NULL
//! ```
//!
//! or a document with seed rows:
//!
//! ```yaml
//! schema:
//!   books: [...]
//! seed_rows:
//!   books:
//!     - title: The Dispossessed
//! ```

use anyhow::Context;
use sandql_core::{ExecutionResult, SchemaDescription, SeedRows};
use sandql_store::SandqlService;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApplyDocument {
    schema: SchemaDescription,
    #[serde(default)]
    seed_rows: Option<SeedRows>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApplyFile {
    Document(ApplyDocument),
    Bare(SchemaDescription),
}

/// Read a schema file. JSON is valid YAML, so one parser covers both.
fn load(path: &Path) -> anyhow::Result<(SchemaDescription, Option<SeedRows>)> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: ApplyFile = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing schema file {}", path.display()))?;
    Ok(match file {
        ApplyFile::Document(doc) => (doc.schema, doc.seed_rows),
        ApplyFile::Bare(schema) => (schema, None),
    })
}

pub async fn run(service: &SandqlService, tenant: &str, path: &Path) -> anyhow::Result<()> {
    let (schema, seed_rows) = load(path)?;
    tracing::debug!(
        file = %path.display(),
        tables = schema.len(),
        seeded_tables = seed_rows.as_ref().map_or(0, |s| s.len()),
        "loaded schema file"
    );
    let result = service.apply_schema(tenant, &schema, seed_rows.as_ref()).await;

    match result {
        ExecutionResult::Failure { error, message } => anyhow::bail!("{error}: {message}"),
        ExecutionResult::Mutation { rows_affected, .. } => {
            println!(
                "✔ Applied {} table(s) to {tenant}, seeded {rows_affected} row(s)",
                schema.len()
            );
            Ok(())
        }
        other => {
            println!("{}", serde_json::to_string_pretty(&other)?);
            Ok(())
        }
    }
}
