// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `LedgerStore` trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use rollcall_config::StorageConfig;
use rollcall_core::{
    AdapterType, AttendanceRecord, CreateOutcome, Fine, HealthStatus, LedgerStore, Member,
    MemberHint, NewRecord, PluginAdapter, RollcallError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed Attendance Ledger.
///
/// The database is opened on [`LedgerStore::initialize`]; every other
/// operation fails with `StoreUnavailable` until then.
pub struct SqliteLedger {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteLedger {
    /// Create a ledger for the given configuration without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, RollcallError> {
        let ledger = Self::new(config);
        ledger.initialize().await?;
        Ok(ledger)
    }

    fn db(&self) -> Result<&Database, RollcallError> {
        self.db
            .get()
            .ok_or_else(|| RollcallError::store("ledger not initialized, call initialize() first"))
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), RollcallError> {
        if self.config.wal_mode {
            db.call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
                .await?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteLedger {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RollcallError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        match db.call(|conn| conn.execute_batch("SELECT 1;")).await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), RollcallError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn initialize(&self) -> Result<(), RollcallError> {
        let db = Database::open(&self.config).await?;
        self.db
            .set(db)
            .map_err(|_| RollcallError::Internal("ledger already initialized".into()))?;
        debug!(path = %self.config.database_path, "SQLite ledger initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RollcallError> {
        self.checkpoint(self.db()?).await
    }

    // --- Members ---

    async fn get_or_create_member(
        &self,
        external_id: i64,
        hint: &MemberHint,
    ) -> Result<Member, RollcallError> {
        queries::members::get_or_create(self.db()?, external_id, hint).await
    }

    async fn find_member(&self, external_id: i64) -> Result<Option<Member>, RollcallError> {
        queries::members::find(self.db()?, external_id).await
    }

    async fn list_members(&self) -> Result<Vec<Member>, RollcallError> {
        queries::members::list(self.db()?, false).await
    }

    async fn list_active_members(&self) -> Result<Vec<Member>, RollcallError> {
        queries::members::list(self.db()?, true).await
    }

    async fn set_member_active(
        &self,
        external_id: i64,
        active: bool,
    ) -> Result<Member, RollcallError> {
        queries::members::set_active(self.db()?, external_id, active)
            .await?
            .ok_or(RollcallError::MemberNotFound { external_id })
    }

    // --- Records and fines ---

    async fn try_create_record(&self, record: NewRecord) -> Result<CreateOutcome, RollcallError> {
        queries::records::try_create(self.db()?, record).await
    }

    async fn upsert_fine(
        &self,
        member_id: i64,
        day: NaiveDate,
        amount: f64,
    ) -> Result<(), RollcallError> {
        queries::fines::upsert(self.db()?, member_id, day, amount).await
    }

    async fn replace_record_and_fine(&self, record: NewRecord) -> Result<(), RollcallError> {
        queries::records::replace_with_fine(self.db()?, record).await
    }

    async fn get_record(
        &self,
        member_id: i64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, RollcallError> {
        queries::records::get(self.db()?, member_id, day).await
    }

    async fn get_fine(
        &self,
        member_id: i64,
        day: NaiveDate,
    ) -> Result<Option<Fine>, RollcallError> {
        queries::fines::get(self.db()?, member_id, day).await
    }

    async fn sum_fines(&self, member_id: i64) -> Result<f64, RollcallError> {
        queries::fines::sum_for_member(self.db()?, member_id).await
    }

    async fn list_records(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, RollcallError> {
        queries::records::list_between(self.db()?, from, to).await
    }

    async fn list_fines(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Fine>, RollcallError> {
        queries::fines::list_between(self.db()?, from, to).await
    }

    // --- Settings ---

    async fn get_setting(&self, key: &str) -> Result<Option<String>, RollcallError> {
        queries::settings::get(self.db()?, key).await
    }

    async fn get_settings(&self, keys: &[&str]) -> Result<Vec<Option<String>>, RollcallError> {
        queries::settings::get_many(self.db()?, keys).await
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), RollcallError> {
        queries::settings::put(self.db()?, key, value).await
    }

    async fn put_settings(&self, entries: &[(&str, &str)]) -> Result<(), RollcallError> {
        queries::settings::put_many(self.db()?, entries).await
    }
}
