// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fine operations.

use chrono::{NaiveDate, Utc};
use rollcall_core::{Fine, RollcallError};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;

fn map_fine(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fine> {
    Ok(Fine {
        member_id: row.get(0)?,
        day: row.get(1)?,
        amount: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Insert the fine for `(member_id, day)` or replace its amount.
///
/// Shared by the standalone upsert and the record transactions so both
/// paths write fines identically.
pub(crate) fn upsert_in(
    conn: &rusqlite::Connection,
    member_id: i64,
    day: NaiveDate,
    amount: f64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO fines (member_id, day, amount, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(member_id, day) DO UPDATE SET amount = excluded.amount",
        params![member_id, day, amount, Utc::now()],
    )?;
    Ok(())
}

pub async fn upsert(
    db: &Database,
    member_id: i64,
    day: NaiveDate,
    amount: f64,
) -> Result<(), RollcallError> {
    db.call(move |conn| upsert_in(conn, member_id, day, amount))
        .await
}

pub async fn get(
    db: &Database,
    member_id: i64,
    day: NaiveDate,
) -> Result<Option<Fine>, RollcallError> {
    db.call(move |conn| {
        conn.query_row(
            "SELECT member_id, day, amount, created_at FROM fines
             WHERE member_id = ?1 AND day = ?2",
            params![member_id, day],
            map_fine,
        )
        .optional()
    })
    .await
}

/// Total of every fine issued to the member; zero when none.
pub async fn sum_for_member(db: &Database, member_id: i64) -> Result<f64, RollcallError> {
    db.call(move |conn| {
        conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM fines WHERE member_id = ?1",
            params![member_id],
            |row| row.get(0),
        )
    })
    .await
}

/// Fines with `from <= day <= to`.
pub async fn list_between(
    db: &Database,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Fine>, RollcallError> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT member_id, day, amount, created_at FROM fines
             WHERE day >= ?1 AND day <= ?2 ORDER BY day, member_id",
        )?;
        let rows = stmt.query_map(params![from, to], map_fine)?;
        rows.collect()
    })
    .await
}
