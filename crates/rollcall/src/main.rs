// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rollcall - group attendance tracking with late and absence fines.
//!
//! This is the binary entry point.

mod ops;
mod serve;
mod stack;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rollcall_attendance::ForcedStatus;

use crate::ops::{ExportTarget, Operation};

/// Rollcall - group attendance tracking with late and absence fines.
#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Telegram bot and the daily window scheduler.
    Serve,
    /// Mark every active member without a record as absent.
    Reconcile {
        /// Day to reconcile (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Print the attendance report for a day.
    Report {
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Write a CSV export.
    Export(ExportArgs),
    /// Override a member's status for a day.
    ForceMark {
        /// Telegram user id of the member.
        member_id: i64,
        /// `present` or `absent`.
        status: ForcedStatus,
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Set the fine charged for late and absent days.
    SetFine { amount: String },
    /// Set the attendance window (HH:MM HH:MM).
    SetWindow { start: String, end: String },
    /// Set the daily report time (HH:MM).
    SetReportTime { at: String },
    /// List members with their fine totals.
    Members,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    target: ExportTargetArgs,
    /// Output directory; defaults to `attendance.export_dir`.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ExportTargetArgs {
    /// Daily export for YYYY-MM-DD.
    #[arg(long)]
    day: Option<NaiveDate>,
    /// Monthly export for YYYY-MM.
    #[arg(long)]
    month: Option<String>,
}

impl ExportArgs {
    fn into_operation(self) -> Option<Operation> {
        let target = self
            .target
            .day
            .map(ExportTarget::Day)
            .or(self.target.month.map(ExportTarget::Month))?;
        Some(Operation::Export {
            target,
            out: self.out,
        })
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => rollcall_config::load_and_validate_path(path),
        None => rollcall_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            rollcall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.service.log_level);

    let operation = match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("rollcall: {e}");
                std::process::exit(1);
            }
            return;
        }
        Some(Commands::Reconcile { day }) => Operation::Reconcile { day },
        Some(Commands::Report { day }) => Operation::Report { day },
        Some(Commands::Export(args)) => match args.into_operation() {
            Some(op) => op,
            None => {
                eprintln!("rollcall: export requires --day or --month");
                std::process::exit(2);
            }
        },
        Some(Commands::ForceMark {
            member_id,
            status,
            day,
        }) => Operation::ForceMark {
            member_id,
            status,
            day,
        },
        Some(Commands::SetFine { amount }) => Operation::SetFine { amount },
        Some(Commands::SetWindow { start, end }) => Operation::SetWindow { start, end },
        Some(Commands::SetReportTime { at }) => Operation::SetReportTime { at },
        Some(Commands::Members) => Operation::Members,
        None => {
            println!("rollcall: use --help for available commands");
            return;
        }
    };

    if let Err(e) = ops::run_operation(operation, &config).await {
        eprintln!("rollcall: {e}");
        std::process::exit(1);
    }
}
