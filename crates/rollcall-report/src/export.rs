// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV exports.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{Months, NaiveDate};
use chrono_tz::Tz;
use rollcall_core::{AttendanceStatus, Document, LedgerStore, Member, RollcallError};
use tracing::info;

/// A rendered export, ready to upload or write to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Write into `dir`, creating it if needed, and return the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, RollcallError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            RollcallError::Internal(format!("cannot create {}: {e}", dir.display()))
        })?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|e| {
            RollcallError::Internal(format!("cannot write {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }

    /// Wrap as a chat document with `caption`.
    pub fn into_document(self, caption: impl Into<String>) -> Document {
        Document {
            file_name: self.file_name,
            bytes: self.bytes,
            caption: Some(caption.into()),
        }
    }
}

fn csv_err(e: impl std::fmt::Display) -> RollcallError {
    RollcallError::Internal(format!("csv export failed: {e}"))
}

fn finish(writer: csv::Writer<Vec<u8>>, file_name: String) -> Result<ExportFile, RollcallError> {
    let bytes = writer.into_inner().map_err(csv_err)?;
    Ok(ExportFile { file_name, bytes })
}

/// One row per member with a record on `day`, plus active members without one.
///
/// File name: `attendance_YYYYMMDD.csv`.
pub async fn export_daily_csv(
    ledger: &dyn LedgerStore,
    timezone: Tz,
    day: NaiveDate,
) -> Result<ExportFile, RollcallError> {
    let members: HashMap<i64, Member> = ledger
        .list_members()
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let records = ledger.list_records(day, day).await?;
    let fines: HashMap<i64, f64> = ledger
        .list_fines(day, day)
        .await?
        .into_iter()
        .map(|f| (f.member_id, f.amount))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Date",
            "Member ID",
            "Username",
            "Full Name",
            "Status",
            "Timestamp",
            "Fine Amount",
        ])
        .map_err(csv_err)?;

    let date = day.format("%Y-%m-%d").to_string();
    let mut recorded = Vec::with_capacity(records.len());
    for record in &records {
        let Some(member) = members.get(&record.member_id) else {
            continue;
        };
        recorded.push(member.id);
        let timestamp = record
            .signal_at
            .map(|ts| ts.with_timezone(&timezone).format("%H:%M:%S").to_string())
            .unwrap_or_default();
        let fine = fines
            .get(&member.id)
            .map(|f| format!("{f:.2}"))
            .unwrap_or_else(|| "0.00".to_string());
        writer
            .write_record([
                date.clone(),
                member.external_id.to_string(),
                member.username.clone().unwrap_or_default(),
                member.full_name.clone().unwrap_or_default(),
                record.status.to_string(),
                timestamp,
                fine,
            ])
            .map_err(csv_err)?;
    }

    let mut pending: Vec<&Member> = members
        .values()
        .filter(|m| m.is_active && !recorded.contains(&m.id))
        .collect();
    pending.sort_by_key(|m| m.id);
    for member in pending {
        writer
            .write_record([
                date.clone(),
                member.external_id.to_string(),
                member.username.clone().unwrap_or_default(),
                member.full_name.clone().unwrap_or_default(),
                "pending".to_string(),
                String::new(),
                "0.00".to_string(),
            ])
            .map_err(csv_err)?;
    }

    finish(writer, format!("attendance_{}.csv", day.format("%Y%m%d")))
}

#[derive(Default)]
struct MonthTotals {
    present: u32,
    late: u32,
    absent: u32,
    fines: f64,
}

/// Per-member counts and fine totals for one calendar month.
///
/// Includes every active member and any inactive member with activity in
/// the month. File name: `attendance_YYYY_MM.csv`.
pub async fn export_monthly_csv(
    ledger: &dyn LedgerStore,
    year: i32,
    month: u32,
) -> Result<ExportFile, RollcallError> {
    let (first, last) = month_bounds(year, month)?;
    let records = ledger.list_records(first, last).await?;
    let fines = ledger.list_fines(first, last).await?;

    let mut totals: BTreeMap<i64, MonthTotals> = BTreeMap::new();
    for record in &records {
        let entry = totals.entry(record.member_id).or_default();
        match record.status {
            AttendanceStatus::Present => entry.present += 1,
            AttendanceStatus::Late => entry.late += 1,
            AttendanceStatus::Absent => entry.absent += 1,
        }
    }
    for fine in &fines {
        totals.entry(fine.member_id).or_default().fines += fine.amount;
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Month",
            "Member ID",
            "Username",
            "Full Name",
            "Present Days",
            "Late Days",
            "Absent Days",
            "Total Fines",
        ])
        .map_err(csv_err)?;

    let label = format!("{year:04}-{month:02}");
    for member in ledger.list_members().await? {
        let counts = totals.remove(&member.id);
        if counts.is_none() && !member.is_active {
            continue;
        }
        let counts = counts.unwrap_or_default();
        writer
            .write_record([
                label.clone(),
                member.external_id.to_string(),
                member.username.clone().unwrap_or_default(),
                member.full_name.clone().unwrap_or_default(),
                counts.present.to_string(),
                counts.late.to_string(),
                counts.absent.to_string(),
                format!("{:.2}", counts.fines),
            ])
            .map_err(csv_err)?;
    }

    finish(writer, format!("attendance_{year:04}_{month:02}.csv"))
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), RollcallError> {
    let invalid =
        || RollcallError::InvalidInput(format!("{year:04}-{month:02} is not a valid month"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

/// Parse `YYYY-MM`.
pub fn parse_month(value: &str) -> Result<(i32, u32), RollcallError> {
    let invalid = || RollcallError::InvalidInput(format!("`{value}` is not a YYYY-MM month"));
    let (y, m) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    month_bounds(year, month)?;
    Ok((year, month))
}
