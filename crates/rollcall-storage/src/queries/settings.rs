// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key/value settings.

use chrono::Utc;
use rollcall_core::RollcallError;
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;

pub async fn get(db: &Database, key: &str) -> Result<Option<String>, RollcallError> {
    let key = key.to_string();
    db.call(move |conn| {
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
    })
    .await
}

/// Read several keys inside one deferred transaction.
pub async fn get_many(db: &Database, keys: &[&str]) -> Result<Vec<Option<String>>, RollcallError> {
    let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        let values = {
            let mut stmt = tx.prepare_cached("SELECT value FROM settings WHERE key = ?1")?;
            keys.iter()
                .map(|key| stmt.query_row(params![key], |row| row.get(0)).optional())
                .collect::<rusqlite::Result<Vec<Option<String>>>>()?
        };
        tx.commit()?;
        Ok(values)
    })
    .await
}

fn put_in(conn: &rusqlite::Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now()],
    )?;
    Ok(())
}

/// Store `value` under `key`, overwriting any previous value.
pub async fn put(db: &Database, key: &str, value: &str) -> Result<(), RollcallError> {
    let key = key.to_string();
    let value = value.to_string();
    db.call(move |conn| put_in(conn, &key, &value)).await
}

/// Store several settings in one transaction.
pub async fn put_many(db: &Database, entries: &[(&str, &str)]) -> Result<(), RollcallError> {
    let entries: Vec<(String, String)> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    db.call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in &entries {
            put_in(&tx, key, value)?;
        }
        tx.commit()
    })
    .await
}
