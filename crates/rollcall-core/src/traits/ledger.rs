// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Attendance Ledger contract.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::RollcallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AttendanceRecord, CreateOutcome, Fine, Member, MemberHint, NewRecord};

/// Authoritative store of members, attendance records, fines and settings.
///
/// Implementations enforce at most one record and at most one fine per
/// `(member, day)` with the store's own unique constraints, so concurrent
/// writers in separate tasks cannot both create the first record of a day.
/// Every operation fails with [`RollcallError::StoreUnavailable`] instead of
/// blocking indefinitely.
#[async_trait]
pub trait LedgerStore: PluginAdapter {
    /// Runs migrations and applies connection settings.
    async fn initialize(&self) -> Result<(), RollcallError>;

    /// Flushes pending writes and closes the connection.
    async fn close(&self) -> Result<(), RollcallError>;

    // --- Members ---

    /// Returns the member for `external_id`, creating an active one if absent.
    ///
    /// Non-empty hints that differ from stored values replace them in place.
    async fn get_or_create_member(
        &self,
        external_id: i64,
        hint: &MemberHint,
    ) -> Result<Member, RollcallError>;

    async fn find_member(&self, external_id: i64) -> Result<Option<Member>, RollcallError>;

    /// All members, active or not, ordered by creation.
    async fn list_members(&self) -> Result<Vec<Member>, RollcallError>;

    async fn list_active_members(&self) -> Result<Vec<Member>, RollcallError>;

    /// Toggles the active flag. Fails with `MemberNotFound` for unknown ids.
    async fn set_member_active(
        &self,
        external_id: i64,
        active: bool,
    ) -> Result<Member, RollcallError>;

    // --- Records and fines ---

    /// Creates the record and its optional fine in one transaction.
    ///
    /// Returns [`CreateOutcome::Conflict`] with the existing status when a
    /// record for `(member, day)` already exists; nothing is written then.
    async fn try_create_record(&self, record: NewRecord) -> Result<CreateOutcome, RollcallError>;

    /// Creates the fine for `(member, day)` or replaces its amount.
    async fn upsert_fine(
        &self,
        member_id: i64,
        day: NaiveDate,
        amount: f64,
    ) -> Result<(), RollcallError>;

    /// Deletes any record and fine for `(member, day)` and writes the new pair.
    ///
    /// The only sanctioned overwrite path.
    async fn replace_record_and_fine(&self, record: NewRecord) -> Result<(), RollcallError>;

    async fn get_record(
        &self,
        member_id: i64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, RollcallError>;

    async fn get_fine(&self, member_id: i64, day: NaiveDate)
    -> Result<Option<Fine>, RollcallError>;

    /// Sum of every fine ever issued to the member.
    async fn sum_fines(&self, member_id: i64) -> Result<f64, RollcallError>;

    /// Records with `from <= day <= to`, ordered by day then member.
    async fn list_records(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, RollcallError>;

    /// Fines with `from <= day <= to`, ordered by day then member.
    async fn list_fines(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Fine>, RollcallError>;

    // --- Settings ---

    async fn get_setting(&self, key: &str) -> Result<Option<String>, RollcallError>;

    /// Reads several keys from one snapshot, in the order given.
    async fn get_settings(&self, keys: &[&str]) -> Result<Vec<Option<String>>, RollcallError>;

    /// Last writer wins.
    async fn put_setting(&self, key: &str, value: &str) -> Result<(), RollcallError>;

    /// Writes every `(key, value)` pair in one transaction: readers see all
    /// of them or none.
    async fn put_settings(&self, entries: &[(&str, &str)]) -> Result<(), RollcallError>;
}
