//! Tenant store files.
//!
//! Each tenant owns one SQLite file under the configured data directory.
//! Opening is idempotent: an existing file from an earlier process lifetime is
//! reused, a missing one is created empty.

use crate::error::StoreError;
use crate::journal;
use sandql_core::{JournalMode, StorageConfig, TenantId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::{ConnectOptions, Executor};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File extension of tenant stores.
pub const STORE_EXTENSION: &str = "sqlite";

/// Maps tenants to store files and opens them.
#[derive(Debug, Clone)]
pub struct TenantStorage {
    config: StorageConfig,
}

impl TenantStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of a tenant's store file.
    pub fn path_for(&self, tenant: &TenantId) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.{}", tenant.file_stem(), STORE_EXTENSION))
    }

    /// Whether a store file already exists for this tenant.
    pub fn exists(&self, tenant: &TenantId) -> bool {
        self.path_for(tenant).exists()
    }

    /// Open (creating if needed) a tenant's store and make sure the internal
    /// journal tables exist.
    pub async fn open(&self, tenant: &TenantId) -> Result<SqliteConnection, StoreError> {
        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .map_err(|e| StoreError::unavailable(tenant, e))?;

        let path = self.path_for(tenant);
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(journal_mode(self.config.journal_mode))
            .busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .foreign_keys(true);

        let mut conn = options
            .connect()
            .await
            .map_err(|e| StoreError::unavailable(tenant, e))?;

        forbid_attach(&mut conn)
            .await
            .map_err(|e| StoreError::unavailable(tenant, e))?;

        (&mut conn)
            .execute(journal::BOOTSTRAP_SQL)
            .await
            .map_err(|e| StoreError::unavailable(tenant, e))?;

        tracing::debug!(tenant = %tenant, path = %path.display(), "Opened tenant store");
        Ok(conn)
    }
}

/// Drop the connection's attached-database limit to zero, so no statement can
/// reach another tenant's file through `ATTACH` or `VACUUM INTO`.
async fn forbid_attach(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let mut handle = conn.lock_handle().await?;
    // SAFETY: the handle stays locked, and therefore valid, for the call
    unsafe {
        libsqlite3_sys::sqlite3_limit(
            handle.as_raw_handle().as_ptr(),
            libsqlite3_sys::SQLITE_LIMIT_ATTACHED,
            0,
        );
    }
    Ok(())
}

fn journal_mode(mode: JournalMode) -> SqliteJournalMode {
    match mode {
        JournalMode::Wal => SqliteJournalMode::Wal,
        JournalMode::Delete => SqliteJournalMode::Delete,
        JournalMode::Memory => SqliteJournalMode::Memory,
    }
}
