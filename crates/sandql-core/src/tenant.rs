//! Tenant identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted tenant id, in bytes.
pub const MAX_TENANT_ID_LEN: usize = 128;

/// Longest id that maps to a readable file stem instead of a hex one.
const MAX_PLAIN_STEM_LEN: usize = 64;

/// Opaque, stable identifier of one user's data space.
///
/// The authentication collaborator hands this over already validated; the
/// only checks applied here are the ones storage needs (non-empty, bounded).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

/// Rejection reasons for a tenant id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantIdError {
    #[error("tenant id must be non-empty")]
    Empty,

    #[error("tenant id is longer than {MAX_TENANT_ID_LEN} bytes")]
    TooLong,
}

impl TenantId {
    /// Validate and wrap a tenant id.
    pub fn new(id: impl Into<String>) -> Result<Self, TenantIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TenantIdError::Empty);
        }
        if id.len() > MAX_TENANT_ID_LEN {
            return Err(TenantIdError::TooLong);
        }
        Ok(Self(id))
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem used for this tenant's store.
    ///
    /// Plain ids (`[A-Za-z0-9_-]`, up to 64 chars) keep their name behind a
    /// `t_` prefix; anything else is hex-encoded behind `x_`. The prefixes keep
    /// the mapping injective and no stem can contain a path separator.
    pub fn file_stem(&self) -> String {
        let plain = self.0.len() <= MAX_PLAIN_STEM_LEN
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if plain {
            format!("t_{}", self.0)
        } else {
            let hex: String = self.0.bytes().map(|b| format!("{b:02x}")).collect();
            format!("x_{hex}")
        }
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = TenantIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TenantId {
    type Error = TenantIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
