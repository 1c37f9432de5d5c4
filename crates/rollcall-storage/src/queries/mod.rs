// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per ledger entity.

pub mod fines;
pub mod members;
pub mod records;
pub mod settings;

use std::str::FromStr;

use rollcall_core::AttendanceStatus;
use rusqlite::types::Type;

/// Reads an `AttendanceStatus` stored as lowercase text in column `idx`.
pub(crate) fn status_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<AttendanceStatus> {
    let raw: String = row.get(idx)?;
    AttendanceStatus::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
