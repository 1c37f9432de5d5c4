// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Point-in-time view of one day's attendance.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rollcall_core::{AttendanceStatus, LedgerStore, Member, RollcallError};

/// One member's outcome for the day.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub member: Member,
    pub status: AttendanceStatus,
    pub signal_at: Option<DateTime<Utc>>,
    pub fine: Option<f64>,
}

/// Snapshot of a day, restricted to active members.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub day: NaiveDate,
    pub timezone: Tz,
    pub total_members: usize,
    pub present: Vec<ReportLine>,
    pub late: Vec<ReportLine>,
    pub absent: Vec<ReportLine>,
    /// Active members with no record yet.
    pub pending: Vec<Member>,
    /// All-time fine totals, largest first, members with none omitted.
    pub running_fines: Vec<(Member, f64)>,
}

impl DailyReport {
    pub async fn build(
        ledger: &dyn LedgerStore,
        timezone: Tz,
        day: NaiveDate,
    ) -> Result<Self, RollcallError> {
        let members = ledger.list_active_members().await?;
        let records: HashMap<i64, _> = ledger
            .list_records(day, day)
            .await?
            .into_iter()
            .map(|r| (r.member_id, r))
            .collect();
        let fines: HashMap<i64, f64> = ledger
            .list_fines(day, day)
            .await?
            .into_iter()
            .map(|f| (f.member_id, f.amount))
            .collect();

        let mut report = Self {
            day,
            timezone,
            total_members: members.len(),
            present: Vec::new(),
            late: Vec::new(),
            absent: Vec::new(),
            pending: Vec::new(),
            running_fines: Vec::new(),
        };

        for member in members {
            let total = ledger.sum_fines(member.id).await?;
            if total > 0.0 {
                report.running_fines.push((member.clone(), total));
            }

            let Some(record) = records.get(&member.id) else {
                report.pending.push(member);
                continue;
            };
            let line = ReportLine {
                status: record.status,
                signal_at: record.signal_at,
                fine: fines.get(&member.id).copied(),
                member,
            };
            match line.status {
                AttendanceStatus::Present => report.present.push(line),
                AttendanceStatus::Late => report.late.push(line),
                AttendanceStatus::Absent => report.absent.push(line),
            }
        }

        report
            .running_fines
            .sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        Ok(report)
    }

    /// Sum of fines issued for this day.
    pub fn fines_for_day(&self) -> f64 {
        self.late
            .iter()
            .chain(&self.absent)
            .filter_map(|line| line.fine)
            .sum()
    }
}
