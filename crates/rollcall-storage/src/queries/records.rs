// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attendance record operations.
//!
//! Records and their fines are written in the same transaction, so a
//! submission either leaves both rows or neither.

use chrono::{NaiveDate, Utc};
use rollcall_core::{AttendanceRecord, CreateOutcome, NewRecord, RollcallError};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;
use crate::queries::fines::upsert_in;
use crate::queries::status_column;

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        member_id: row.get(0)?,
        day: row.get(1)?,
        status: status_column(row, 2)?,
        signal_at: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn insert_in(conn: &rusqlite::Connection, record: &NewRecord) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO attendance_records (member_id, day, status, signal_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(member_id, day) DO NOTHING",
        params![
            record.member_id,
            record.day,
            record.status.to_string(),
            record.signal_at,
            Utc::now(),
        ],
    )
}

/// Create the record (and fine) unless one already exists for the day.
///
/// The unique `(member_id, day)` index decides the race: the losing insert
/// affects zero rows, the transaction is rolled back, and the existing
/// status is reported.
pub async fn try_create(db: &Database, record: NewRecord) -> Result<CreateOutcome, RollcallError> {
    db.call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if insert_in(&tx, &record)? == 0 {
            let existing = tx.query_row(
                "SELECT status FROM attendance_records WHERE member_id = ?1 AND day = ?2",
                params![record.member_id, record.day],
                |row| status_column(row, 0),
            )?;
            return Ok(CreateOutcome::Conflict(existing));
        }
        if let Some(amount) = record.fine {
            upsert_in(&tx, record.member_id, record.day, amount)?;
        }
        tx.commit()?;
        Ok(CreateOutcome::Created)
    })
    .await
}

/// Delete any record and fine for the day, then write the new pair.
pub async fn replace_with_fine(db: &Database, record: NewRecord) -> Result<(), RollcallError> {
    db.call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM fines WHERE member_id = ?1 AND day = ?2",
            params![record.member_id, record.day],
        )?;
        tx.execute(
            "DELETE FROM attendance_records WHERE member_id = ?1 AND day = ?2",
            params![record.member_id, record.day],
        )?;
        insert_in(&tx, &record)?;
        if let Some(amount) = record.fine {
            upsert_in(&tx, record.member_id, record.day, amount)?;
        }
        tx.commit()
    })
    .await
}

pub async fn get(
    db: &Database,
    member_id: i64,
    day: NaiveDate,
) -> Result<Option<AttendanceRecord>, RollcallError> {
    db.call(move |conn| {
        conn.query_row(
            "SELECT member_id, day, status, signal_at, created_at FROM attendance_records
             WHERE member_id = ?1 AND day = ?2",
            params![member_id, day],
            map_record,
        )
        .optional()
    })
    .await
}

/// Records with `from <= day <= to`.
pub async fn list_between(
    db: &Database,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AttendanceRecord>, RollcallError> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT member_id, day, status, signal_at, created_at FROM attendance_records
             WHERE day >= ?1 AND day <= ?2 ORDER BY day, member_id",
        )?;
        let rows = stmt.query_map(params![from, to], map_record)?;
        rows.collect()
    })
    .await
}
