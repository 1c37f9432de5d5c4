// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use rollcall_config::StorageConfig;
use rollcall_core::RollcallError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the ledger database.
///
/// Wraps the single `tokio_rusqlite::Connection` and bounds every call by
/// the configured operation timeout.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    op_timeout: Duration,
}

impl Database {
    /// Open (creating if needed) the database at `config.database_path`,
    /// apply PRAGMAs, and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, RollcallError> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(RollcallError::store)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(RollcallError::store)?;
        let db = Self {
            conn,
            op_timeout: Duration::from_millis(config.operation_timeout_ms),
        };
        db.prepare(config.wal_mode, config.busy_timeout_ms).await?;
        debug!(path = %config.database_path, wal = config.wal_mode, "ledger database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the same schema.
    pub async fn open_in_memory(op_timeout: Duration) -> Result<Self, RollcallError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(RollcallError::store)?;
        let db = Self { conn, op_timeout };
        db.prepare(false, 0).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool, busy_timeout_ms: u64) -> Result<(), RollcallError> {
        self.conn
            .call(move |conn| -> Result<(), RollcallError> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")
                        .map_err(RollcallError::store)?;
                    conn.pragma_update(None, "synchronous", "NORMAL")
                        .map_err(RollcallError::store)?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")
                    .map_err(RollcallError::store)?;
                conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
                    .map_err(RollcallError::store)?;
                run_migrations(conn)
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => map_tr_err(other),
            })
    }

    /// The underlying connection. Prefer [`Database::call`].
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run `f` on the writer thread, failing with `StoreUnavailable` if it
    /// errors or does not finish within the operation timeout.
    pub async fn call<F, R>(&self, f: F) -> Result<R, RollcallError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        match tokio::time::timeout(self.op_timeout, self.conn.call(f)).await {
            Ok(result) => result.map_err(map_tr_err),
            Err(_) => Err(RollcallError::store(format!(
                "ledger operation exceeded {} ms",
                self.op_timeout.as_millis()
            ))),
        }
    }
}

/// Map a tokio-rusqlite error to `RollcallError::StoreUnavailable`.
pub fn map_tr_err<E>(err: tokio_rusqlite::Error<E>) -> RollcallError
where
    E: std::error::Error + Send + Sync + 'static,
{
    match err {
        tokio_rusqlite::Error::Error(e) => RollcallError::store(e),
        tokio_rusqlite::Error::ConnectionClosed => {
            RollcallError::store("ledger connection is closed")
        }
        other => RollcallError::store(other.to_string()),
    }
}
