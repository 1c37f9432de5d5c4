// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily report snapshots, chat rendering, and CSV exports.

pub mod export;
pub mod format;
pub mod snapshot;

pub use export::{ExportFile, export_daily_csv, export_monthly_csv, month_bounds, parse_month};
pub use format::{format_money, render_daily_report};
pub use snapshot::{DailyReport, ReportLine};
