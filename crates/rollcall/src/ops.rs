// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator subcommands run against the ledger without the bot.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rollcall_attendance::ForcedStatus;
use rollcall_attendance::clock::parse_time_of_day;
use rollcall_attendance::settings::parse_amount;
use rollcall_config::RollcallConfig;
use rollcall_core::RollcallError;
use rollcall_report::{
    DailyReport, export_daily_csv, export_monthly_csv, format_money, parse_month,
    render_daily_report,
};

use crate::stack::Stack;

/// What to export.
pub enum ExportTarget {
    Day(NaiveDate),
    Month(String),
}

pub enum Operation {
    Reconcile { day: Option<NaiveDate> },
    Report { day: Option<NaiveDate> },
    Export { target: ExportTarget, out: Option<PathBuf> },
    ForceMark {
        member_id: i64,
        status: ForcedStatus,
        day: Option<NaiveDate>,
    },
    SetFine { amount: String },
    SetWindow { start: String, end: String },
    SetReportTime { at: String },
    Members,
}

pub async fn run_operation(op: Operation, config: &RollcallConfig) -> Result<(), RollcallError> {
    let stack = Stack::open(config).await?;
    let result = execute(&stack, op, config).await;
    stack.ledger.close().await?;
    result
}

async fn execute(
    stack: &Stack,
    op: Operation,
    config: &RollcallConfig,
) -> Result<(), RollcallError> {
    let currency = stack.settings.currency();
    let tz = stack.settings.timezone();

    match op {
        Operation::Reconcile { day } => {
            let day = day.unwrap_or_else(|| stack.today());
            let summary = stack.reconciler.reconcile(day).await?;
            println!(
                "{day}: {} examined, {} marked absent, {} already recorded",
                summary.examined, summary.marked_absent, summary.skipped
            );
        }
        Operation::Report { day } => {
            let day = day.unwrap_or_else(|| stack.today());
            let report = DailyReport::build(stack.ledger.as_ref(), tz, day).await?;
            println!("{}", render_daily_report(&report, true, currency));
        }
        Operation::Export { target, out } => {
            let file = match target {
                ExportTarget::Day(day) => export_daily_csv(stack.ledger.as_ref(), tz, day).await?,
                ExportTarget::Month(month) => {
                    let (year, month) = parse_month(&month)?;
                    export_monthly_csv(stack.ledger.as_ref(), year, month).await?
                }
            };
            let dir = out.unwrap_or_else(|| PathBuf::from(&config.attendance.export_dir));
            let path = file.write_to(Path::new(&dir))?;
            println!("{}", path.display());
        }
        Operation::ForceMark {
            member_id,
            status,
            day,
        } => {
            let outcome = stack.admin.force_mark(member_id, status, day).await?;
            let fine = outcome
                .fine
                .map(|f| format!(", fine {}", format_money(f, currency)))
                .unwrap_or_default();
            println!(
                "{} marked {} for {}{fine}",
                outcome.member.display_name(),
                outcome.status,
                outcome.day
            );
        }
        Operation::SetFine { amount } => {
            let amount = parse_amount(&amount)?;
            stack.admin.set_fine_amount(amount).await?;
            println!("fine amount set to {}", format_money(amount, currency));
        }
        Operation::SetWindow { start, end } => {
            let start = parse_time_of_day(&start)?;
            let end = parse_time_of_day(&end)?;
            stack.admin.set_window(start, end).await?;
            println!(
                "attendance window set to {}-{}",
                start.format("%H:%M"),
                end.format("%H:%M")
            );
        }
        Operation::SetReportTime { at } => {
            let at = parse_time_of_day(&at)?;
            stack.admin.set_report_time(at).await?;
            println!("report time set to {}", at.format("%H:%M"));
        }
        Operation::Members => {
            for member in stack.ledger.list_members().await? {
                let total = stack.ledger.sum_fines(member.id).await?;
                println!(
                    "{}\t{}\t{}\t{}",
                    member.external_id,
                    if member.is_active { "active" } else { "inactive" },
                    member.display_name(),
                    format_money(total, currency)
                );
            }
        }
    }
    Ok(())
}
