//! Statement classification.

use crate::error::ClassifyError;
use crate::parser::SqlAnalyzer;
use regex::Regex;
use sandql_core::config::DEFAULT_DENYLIST;
use sandql_core::{ClassifierMode, GuardrailsConfig, StatementCategory, StatementVerdict};
use std::sync::LazyLock;

static DEFAULT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    build_pattern(DEFAULT_DENYLIST.iter().copied())
        .expect("built-in denylist compiles to a valid pattern")
});

/// Commands that reach files other than the tenant's own store. Always
/// rejected, whatever the configured denylist and mode.
static STORE_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ATTACH|DETACH)\b|\bVACUUM\b(?:\s+\w+)?\s+INTO\b")
        .expect("valid store escape pattern")
});

/// First word of a statement, as written (no case folding).
pub fn leading_keyword(sql: &str) -> &str {
    let trimmed = sql.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// Category of a statement: `READ` when it starts with `SELECT`.
///
/// Matching uses a trimmed, case-folded view; the text itself is untouched.
pub fn category_of(sql: &str) -> StatementCategory {
    if leading_keyword(sql).eq_ignore_ascii_case("SELECT") {
        StatementCategory::Read
    } else {
        StatementCategory::Write
    }
}

/// Pure, thread-safe statement classifier.
#[derive(Debug, Clone)]
pub struct StatementClassifier {
    mode: ClassifierMode,
    /// `None` when the denylist is empty.
    pattern: Option<Regex>,
    analyzer: SqlAnalyzer,
}

impl Default for StatementClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementClassifier {
    /// Classifier with the built-in denylist in keyword mode.
    pub fn new() -> Self {
        Self {
            mode: ClassifierMode::Keyword,
            pattern: DEFAULT_PATTERN.clone(),
            analyzer: SqlAnalyzer::new(),
        }
    }

    /// Classifier built from the guardrails section of the configuration.
    pub fn from_config(config: &GuardrailsConfig) -> Result<Self, ClassifyError> {
        let pattern = build_pattern(config.denylist.iter().map(String::as_str))?;
        Ok(Self {
            mode: config.classifier_mode,
            pattern,
            analyzer: SqlAnalyzer::new(),
        })
    }

    /// Switch the matching strategy.
    pub fn with_mode(mut self, mode: ClassifierMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ClassifierMode {
        self.mode
    }

    /// Classify a statement.
    pub fn classify(&self, sql: &str) -> StatementVerdict {
        let category = category_of(sql);

        if sql.trim().is_empty() {
            return StatementVerdict::deny(category, "statement is empty");
        }

        let mut offending = match self.mode {
            ClassifierMode::Keyword => self.keyword_matches(sql),
            ClassifierMode::Parsed => match self.analyzer.destructive_verbs(sql) {
                Ok(verbs) => verbs.into_iter().map(str::to_string).collect(),
                Err(e) => {
                    tracing::debug!(error = %e, "statement did not parse, using keyword scan");
                    self.keyword_matches(sql)
                }
            },
        };
        for keyword in store_escapes(sql) {
            if !offending.contains(&keyword) {
                offending.push(keyword);
            }
        }

        if offending.is_empty() {
            StatementVerdict::allow(category)
        } else {
            StatementVerdict::deny(
                category,
                format!(
                    "statement contains forbidden keyword(s): {}",
                    offending.join(", ")
                ),
            )
        }
    }

    /// Distinct denylisted keywords in order of first appearance, upper-cased.
    fn keyword_matches(&self, sql: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let Some(pattern) = &self.pattern else {
            return found;
        };
        for m in pattern.find_iter(sql) {
            let keyword = m.as_str().to_ascii_uppercase();
            if !found.contains(&keyword) {
                found.push(keyword);
            }
        }
        found
    }
}

/// `ATTACH`, `DETACH` and `VACUUM ... INTO` occurrences, upper-cased.
fn store_escapes(sql: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in STORE_ESCAPE.find_iter(sql) {
        let upper = m.as_str().to_ascii_uppercase();
        let keyword = if upper.starts_with("VACUUM") {
            "VACUUM INTO".to_string()
        } else {
            upper
        };
        if !found.contains(&keyword) {
            found.push(keyword);
        }
    }
    found
}

fn build_pattern<'a>(
    keywords: impl Iterator<Item = &'a str>,
) -> Result<Option<Regex>, ClassifyError> {
    let mut alternatives = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim();
        if keyword.is_empty() || !keyword.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ClassifyError::InvalidKeyword(keyword.to_string()));
        }
        alternatives.push(regex::escape(keyword));
    }
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?;
    Ok(Some(pattern))
}
