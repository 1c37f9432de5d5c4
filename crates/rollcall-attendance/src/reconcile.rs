// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation Engine.

use std::sync::Arc;

use chrono::NaiveDate;
use rollcall_core::{AttendanceStatus, CreateOutcome, LedgerStore, NewRecord, RollcallError};
use tracing::{debug, info, warn};

use crate::settings::AttendanceSettings;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub day: NaiveDate,
    /// Active members considered.
    pub examined: usize,
    /// Members newly marked absent and fined.
    pub marked_absent: usize,
    /// Members that already had a record.
    pub skipped: usize,
}

/// Backfills absences and fines after a window closes.
pub struct Reconciler {
    ledger: Arc<dyn LedgerStore>,
    settings: Arc<AttendanceSettings>,
}

impl Reconciler {
    pub fn new(ledger: Arc<dyn LedgerStore>, settings: Arc<AttendanceSettings>) -> Self {
        Self { ledger, settings }
    }

    /// Mark every active member without a record for `day` absent, with a
    /// fine at the amount in effect when that member's record is written.
    ///
    /// Safe to re-run: members that already have a record, including ones
    /// written by an earlier partial run, are skipped by the ledger's
    /// conditional create. The first store failure aborts the pass.
    pub async fn reconcile(&self, day: NaiveDate) -> Result<ReconcileSummary, RollcallError> {
        let members = self.ledger.list_active_members().await?;
        let mut summary = ReconcileSummary {
            day,
            examined: members.len(),
            marked_absent: 0,
            skipped: 0,
        };

        for member in &members {
            let fine = self.settings.fine_amount().await?;
            let outcome = self
                .ledger
                .try_create_record(NewRecord {
                    member_id: member.id,
                    day,
                    status: AttendanceStatus::Absent,
                    signal_at: None,
                    fine: Some(fine),
                })
                .await
                .inspect_err(|e| {
                    warn!(%day, member = member.external_id, error = %e, "reconciliation aborted");
                })?;

            match outcome {
                CreateOutcome::Created => {
                    debug!(%day, member = member.external_id, fine, "marked absent");
                    summary.marked_absent += 1;
                }
                CreateOutcome::Conflict(_) => summary.skipped += 1,
            }
        }

        info!(
            %day,
            examined = summary.examined,
            marked_absent = summary.marked_absent,
            skipped = summary.skipped,
            "reconciliation complete"
        );
        Ok(summary)
    }
}
