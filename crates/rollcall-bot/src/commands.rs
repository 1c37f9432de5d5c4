// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat command parsing.
//!
//! Commands start with `/`, may carry an `@botname` suffix, and take
//! whitespace-separated arguments. Unknown command names are not an error:
//! the group may be shared with other bots.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rollcall_attendance::ForcedStatus;
use rollcall_attendance::clock::parse_time_of_day;
use rollcall_attendance::settings::parse_amount;
use rollcall_core::RollcallError;
use rollcall_report::parse_month;
use strum::EnumString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
enum CommandName {
    #[strum(serialize = "start")]
    Start,
    #[strum(serialize = "help")]
    Help,
    #[strum(serialize = "fines")]
    Fines,
    #[strum(serialize = "report")]
    Report,
    #[strum(serialize = "export")]
    Export,
    #[strum(serialize = "monthly")]
    Monthly,
    #[strum(serialize = "setfine", serialize = "set-fine", serialize = "set_fine")]
    SetFine,
    #[strum(serialize = "set-window", serialize = "set_window", serialize = "setwindow")]
    SetWindow,
    #[strum(
        serialize = "set-report-time",
        serialize = "set_report_time",
        serialize = "setreporttime"
    )]
    SetReportTime,
    #[strum(serialize = "force-mark", serialize = "force_mark", serialize = "forcemark")]
    ForceMark,
    #[strum(serialize = "activate")]
    Activate,
    #[strum(serialize = "deactivate")]
    Deactivate,
    #[strum(serialize = "reconcile")]
    Reconcile,
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    Fines,
    Report { day: Option<NaiveDate> },
    Export { day: Option<NaiveDate> },
    Monthly { year: i32, month: u32 },
    SetFine { amount: f64 },
    SetWindow { start: NaiveTime, end: NaiveTime },
    SetReportTime { at: NaiveTime },
    ForceMark {
        external_id: i64,
        status: ForcedStatus,
        day: Option<NaiveDate>,
    },
    Activate { external_id: i64 },
    Deactivate { external_id: i64 },
    Reconcile { day: Option<NaiveDate> },
}

impl Command {
    /// Parse `text` as a command.
    ///
    /// `Ok(None)` for plain text and unknown commands; `Err(InvalidInput)`
    /// carrying the usage line when a known command has bad arguments.
    pub fn parse(text: &str) -> Result<Option<Self>, RollcallError> {
        let Some(rest) = text.trim().strip_prefix('/') else {
            return Ok(None);
        };
        let mut parts = rest.split_whitespace();
        let Some(head) = parts.next() else {
            return Ok(None);
        };
        let name = head.split('@').next().unwrap_or(head);
        let Ok(name) = CommandName::from_str(name) else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();

        let command = match name {
            CommandName::Start => Command::Start,
            CommandName::Help => Command::Help,
            CommandName::Fines => Command::Fines,
            CommandName::Report => Command::Report {
                day: optional_day(&args, name)?,
            },
            CommandName::Export => Command::Export {
                day: optional_day(&args, name)?,
            },
            CommandName::Monthly => {
                let [month] = args.as_slice() else {
                    return Err(usage(name));
                };
                let (year, month) = parse_month(month)?;
                Command::Monthly { year, month }
            }
            CommandName::SetFine => {
                let [amount] = args.as_slice() else {
                    return Err(usage(name));
                };
                Command::SetFine {
                    amount: parse_amount(amount)?,
                }
            }
            CommandName::SetWindow => {
                let [start, end] = args.as_slice() else {
                    return Err(usage(name));
                };
                Command::SetWindow {
                    start: parse_time_of_day(start)?,
                    end: parse_time_of_day(end)?,
                }
            }
            CommandName::SetReportTime => {
                let [at] = args.as_slice() else {
                    return Err(usage(name));
                };
                Command::SetReportTime {
                    at: parse_time_of_day(at)?,
                }
            }
            CommandName::ForceMark => {
                let (id, status, day) = match args.as_slice() {
                    [id, status] => (id, status, None),
                    [id, status, day] => (id, status, Some(parse_day(day)?)),
                    _ => return Err(usage(name)),
                };
                Command::ForceMark {
                    external_id: parse_member_id(id)?,
                    status: ForcedStatus::from_str(status).map_err(|_| usage(name))?,
                    day,
                }
            }
            CommandName::Activate | CommandName::Deactivate => {
                let [id] = args.as_slice() else {
                    return Err(usage(name));
                };
                let external_id = parse_member_id(id)?;
                if name == CommandName::Activate {
                    Command::Activate { external_id }
                } else {
                    Command::Deactivate { external_id }
                }
            }
            CommandName::Reconcile => Command::Reconcile {
                day: optional_day(&args, name)?,
            },
        };
        Ok(Some(command))
    }

    /// Whether only configured admins may run this command.
    pub fn is_admin_only(&self) -> bool {
        !matches!(self, Command::Start | Command::Help | Command::Fines)
    }
}

pub const MEMBER_HELP: &str = "\
/start - register with the bot
/help - show this message
/fines - your total fines";

pub const ADMIN_HELP: &str = "\
/report [YYYY-MM-DD] - attendance report
/export [YYYY-MM-DD] - daily CSV export
/monthly YYYY-MM - monthly CSV export
/setfine <amount> - fine for late or absent days
/set-window HH:MM HH:MM - attendance window
/set-report-time HH:MM - daily report time
/force-mark <id> present|absent [YYYY-MM-DD] - override a record
/activate <id> - include a member again
/deactivate <id> - exclude a member from tracking
/reconcile [YYYY-MM-DD] - mark missing members absent";

fn usage(name: CommandName) -> RollcallError {
    let line = match name {
        CommandName::Start => "/start",
        CommandName::Help => "/help",
        CommandName::Fines => "/fines",
        CommandName::Report => "/report [YYYY-MM-DD]",
        CommandName::Export => "/export [YYYY-MM-DD]",
        CommandName::Monthly => "/monthly YYYY-MM",
        CommandName::SetFine => "/setfine <amount>",
        CommandName::SetWindow => "/set-window HH:MM HH:MM",
        CommandName::SetReportTime => "/set-report-time HH:MM",
        CommandName::ForceMark => "/force-mark <id> present|absent [YYYY-MM-DD]",
        CommandName::Activate => "/activate <id>",
        CommandName::Deactivate => "/deactivate <id>",
        CommandName::Reconcile => "/reconcile [YYYY-MM-DD]",
    };
    RollcallError::InvalidInput(format!("usage: {line}"))
}

fn optional_day(args: &[&str], name: CommandName) -> Result<Option<NaiveDate>, RollcallError> {
    match args {
        [] => Ok(None),
        [day] => parse_day(day).map(Some),
        _ => Err(usage(name)),
    }
}

/// Parses `YYYY-MM-DD`.
pub fn parse_day(value: &str) -> Result<NaiveDate, RollcallError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RollcallError::InvalidInput(format!("`{value}` is not a YYYY-MM-DD date")))
}

fn parse_member_id(value: &str) -> Result<i64, RollcallError> {
    value
        .parse::<i64>()
        .map_err(|_| RollcallError::InvalidInput(format!("`{value}` is not a member id")))
}
