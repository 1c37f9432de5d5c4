// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Member operations.

use chrono::Utc;
use rollcall_core::{Member, MemberHint, RollcallError};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;

const MEMBER_COLUMNS: &str = "id, external_id, username, full_name, is_active, created_at";

fn map_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        external_id: row.get(1)?,
        username: row.get(2)?,
        full_name: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn fetch(conn: &rusqlite::Connection, external_id: i64) -> rusqlite::Result<Option<Member>> {
    conn.query_row(
        &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE external_id = ?1"),
        params![external_id],
        map_member,
    )
    .optional()
}

/// A hint value replaces the stored one only when non-empty and different.
fn changed(stored: &Option<String>, hint: &Option<String>) -> Option<String> {
    match hint.as_deref().map(str::trim) {
        Some(h) if !h.is_empty() && stored.as_deref() != Some(h) => Some(h.to_string()),
        _ => None,
    }
}

/// Fetch the member for `external_id` or create it active.
///
/// The insert is `ON CONFLICT DO NOTHING` against the unique external id, so
/// two callers racing on a new id both end up reading the same row.
pub async fn get_or_create(
    db: &Database,
    external_id: i64,
    hint: &MemberHint,
) -> Result<Member, RollcallError> {
    let hint = hint.clone();
    db.call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO members (external_id, username, full_name, is_active, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(external_id) DO NOTHING",
            params![external_id, hint.username, hint.full_name, Utc::now()],
        )?;
        let mut member = fetch(&tx, external_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;

        let username = changed(&member.username, &hint.username);
        let full_name = changed(&member.full_name, &hint.full_name);
        if username.is_some() || full_name.is_some() {
            tx.execute(
                "UPDATE members SET username = COALESCE(?1, username),
                                    full_name = COALESCE(?2, full_name)
                 WHERE id = ?3",
                params![username, full_name, member.id],
            )?;
            if let Some(u) = username {
                member.username = Some(u);
            }
            if let Some(n) = full_name {
                member.full_name = Some(n);
            }
        }
        tx.commit()?;
        Ok(member)
    })
    .await
}

pub async fn find(db: &Database, external_id: i64) -> Result<Option<Member>, RollcallError> {
    db.call(move |conn| fetch(conn, external_id)).await
}

/// All members, or only active ones, in creation order.
pub async fn list(db: &Database, active_only: bool) -> Result<Vec<Member>, RollcallError> {
    db.call(move |conn| {
        let sql = if active_only {
            format!("SELECT {MEMBER_COLUMNS} FROM members WHERE is_active = 1 ORDER BY id")
        } else {
            format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY id")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_member)?;
        rows.collect()
    })
    .await
}

/// Set the active flag, returning the updated member or `None` if unknown.
pub async fn set_active(
    db: &Database,
    external_id: i64,
    active: bool,
) -> Result<Option<Member>, RollcallError> {
    db.call(move |conn| {
        let updated = conn.execute(
            "UPDATE members SET is_active = ?1 WHERE external_id = ?2",
            params![active, external_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        fetch(conn, external_id)
    })
    .await
}
