// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission Processor.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_core::{
    AttendanceStatus, CreateOutcome, LedgerStore, Member, MemberHint, NewRecord, RollcallError,
};
use tracing::{debug, info};

use crate::settings::AttendanceSettings;
use crate::window::WindowGate;

/// A member's presence signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub external_id: i64,
    pub hint: MemberHint,
    /// When the member sent the signal.
    pub at: DateTime<Utc>,
}

/// Outcome of an accepted signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub member: Member,
    pub day: NaiveDate,
    pub status: AttendanceStatus,
    /// Fine charged with this record, if late.
    pub fine: Option<f64>,
}

/// Validates signals against the window and records them in the ledger.
pub struct SubmissionProcessor {
    ledger: Arc<dyn LedgerStore>,
    gate: Arc<WindowGate>,
    settings: Arc<AttendanceSettings>,
}

impl SubmissionProcessor {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        gate: Arc<WindowGate>,
        settings: Arc<AttendanceSettings>,
    ) -> Self {
        Self {
            ledger,
            gate,
            settings,
        }
    }

    /// Record a signal.
    ///
    /// Rejects with `WindowClosed` when the gate is not accepting at
    /// `signal.at`, and with `AlreadyRecorded` when the member already has a
    /// record for the window's day. A late record and its fine are committed
    /// together. Store failures are returned as-is and never retried here.
    pub async fn submit(&self, signal: Signal) -> Result<SubmissionReceipt, RollcallError> {
        let Some(day) = self.gate.accepts(signal.at) else {
            debug!(member = signal.external_id, at = %signal.at, "signal outside window");
            return Err(RollcallError::WindowClosed);
        };

        let member = self
            .ledger
            .get_or_create_member(signal.external_id, &signal.hint)
            .await?;

        let bounds = self.settings.window().await?;
        let status = if bounds.is_on_time(signal.at, self.settings.timezone()) {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Late
        };
        let fine = match status {
            AttendanceStatus::Present => None,
            _ => Some(self.settings.fine_amount().await?),
        };

        let outcome = self
            .ledger
            .try_create_record(NewRecord {
                member_id: member.id,
                day,
                status,
                signal_at: Some(signal.at),
                fine,
            })
            .await?;

        match outcome {
            CreateOutcome::Created => {
                info!(member = member.external_id, %day, %status, ?fine, "attendance recorded");
                Ok(SubmissionReceipt {
                    member,
                    day,
                    status,
                    fine,
                })
            }
            CreateOutcome::Conflict(existing) => {
                debug!(member = member.external_id, %day, %existing, "duplicate signal rejected");
                Err(RollcallError::AlreadyRecorded { status: existing })
            }
        }
    }
}
