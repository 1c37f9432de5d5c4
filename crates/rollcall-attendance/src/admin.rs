// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin Override and settings administration.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rollcall_core::{AttendanceStatus, Clock, LedgerStore, Member, NewRecord, RollcallError};
use strum::{Display, EnumString};
use tracing::info;

use crate::settings::AttendanceSettings;

/// Statuses an administrator may force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ForcedStatus {
    Present,
    Absent,
}

impl From<ForcedStatus> for AttendanceStatus {
    fn from(status: ForcedStatus) -> Self {
        match status {
            ForcedStatus::Present => AttendanceStatus::Present,
            ForcedStatus::Absent => AttendanceStatus::Absent,
        }
    }
}

/// What a forced mark wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceMarkOutcome {
    pub member: Member,
    pub day: NaiveDate,
    pub status: AttendanceStatus,
    pub fine: Option<f64>,
}

/// Operator actions over the ledger and settings.
pub struct AdminService {
    ledger: Arc<dyn LedgerStore>,
    settings: Arc<AttendanceSettings>,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        settings: Arc<AttendanceSettings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            settings,
            clock,
        }
    }

    /// Replace whatever the member has for `day` (default: today).
    ///
    /// Present is stamped with the current instant and carries no fine;
    /// absent has no timestamp and a fine at the current amount.
    pub async fn force_mark(
        &self,
        external_id: i64,
        status: ForcedStatus,
        day: Option<NaiveDate>,
    ) -> Result<ForceMarkOutcome, RollcallError> {
        let member = self.member(external_id).await?;
        let now = self.clock.now();
        let day = day.unwrap_or_else(|| self.settings.today(now));

        let (signal_at, fine) = match status {
            ForcedStatus::Present => (Some(now), None),
            ForcedStatus::Absent => (None, Some(self.settings.fine_amount().await?)),
        };
        let status = AttendanceStatus::from(status);

        self.ledger
            .replace_record_and_fine(NewRecord {
                member_id: member.id,
                day,
                status,
                signal_at,
                fine,
            })
            .await?;

        info!(member = external_id, %day, %status, ?fine, "attendance force-marked");
        Ok(ForceMarkOutcome {
            member,
            day,
            status,
            fine,
        })
    }

    pub async fn set_fine_amount(&self, amount: f64) -> Result<(), RollcallError> {
        self.settings.set_fine_amount(amount).await
    }

    pub async fn set_window(&self, start: NaiveTime, end: NaiveTime) -> Result<(), RollcallError> {
        self.settings.set_window(start, end).await
    }

    pub async fn set_report_time(&self, at: NaiveTime) -> Result<(), RollcallError> {
        self.settings.set_report_time(at).await
    }

    /// Toggle a member's active flag. History is untouched.
    pub async fn set_member_active(
        &self,
        external_id: i64,
        active: bool,
    ) -> Result<Member, RollcallError> {
        let member = self.ledger.set_member_active(external_id, active).await?;
        info!(member = external_id, active, "member activation changed");
        Ok(member)
    }

    /// Sum of all fines ever issued to the member.
    pub async fn member_total_fines(&self, external_id: i64) -> Result<f64, RollcallError> {
        let member = self.member(external_id).await?;
        self.ledger.sum_fines(member.id).await
    }

    async fn member(&self, external_id: i64) -> Result<Member, RollcallError> {
        self.ledger
            .find_member(external_id)
            .await?
            .ok_or(RollcallError::MemberNotFound { external_id })
    }
}
