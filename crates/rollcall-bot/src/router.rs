// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes inbound messages to the Submission Processor or the command surface.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rollcall_attendance::clock::to_local;
use rollcall_attendance::{
    AdminService, AttendanceSettings, Reconciler, Signal, SubmissionProcessor, SubmissionReceipt,
    WindowGate,
};
use rollcall_core::{
    AttendanceStatus, ChannelAdapter, ChatKind, Clock, GroupChat, InboundMessage, LedgerStore,
    OutboundMessage, RollcallError,
};
use rollcall_report::{
    DailyReport, ExportFile, export_daily_csv, export_monthly_csv, format_money,
    render_daily_report,
};
use tracing::{debug, error, info, warn};

use crate::commands::{ADMIN_HELP, Command, MEMBER_HELP};

pub const PRIVATE_SIGNAL_HINT: &str = "Please send '1' in the group chat to record attendance.";
pub const NOT_AUTHORIZED: &str = "⛔ This command is only available to admins.";
pub const SUBMISSION_FAILED: &str =
    "❌ Could not record your attendance right now. Please try again in a moment.";
pub const COMMAND_FAILED: &str = "❌ Something went wrong. Please try again later.";

/// The attendance services a router drives.
#[derive(Clone)]
pub struct AttendanceServices {
    pub ledger: Arc<dyn LedgerStore>,
    pub settings: Arc<AttendanceSettings>,
    pub processor: Arc<SubmissionProcessor>,
    pub reconciler: Arc<Reconciler>,
    pub admin: Arc<AdminService>,
    pub gate: Arc<WindowGate>,
    pub clock: Arc<dyn Clock>,
}

enum Reply {
    Text(String),
    Document(ExportFile, String),
}

/// Handles one inbound message at a time; safe to share across tasks.
pub struct MessageRouter {
    services: AttendanceServices,
    channel: Arc<dyn ChannelAdapter>,
    group: Arc<GroupChat>,
    admin_ids: HashSet<i64>,
    export_dir: Option<PathBuf>,
}

impl MessageRouter {
    pub fn new(
        services: AttendanceServices,
        channel: Arc<dyn ChannelAdapter>,
        group: Arc<GroupChat>,
        admin_ids: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            services,
            channel,
            group,
            admin_ids: admin_ids.into_iter().collect(),
            export_dir: None,
        }
    }

    /// Also write every CSV export into `dir`.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    pub fn is_admin(&self, sender_id: i64) -> bool {
        self.admin_ids.contains(&sender_id)
    }

    pub async fn handle(&self, msg: InboundMessage) {
        if msg.chat_kind == ChatKind::Group && self.group.remember(msg.chat_id) {
            info!(chat_id = msg.chat_id, "group chat registered for announcements");
        }

        let text = msg.text.trim();
        if text == "1" {
            match msg.chat_kind {
                ChatKind::Group => self.handle_signal(&msg).await,
                ChatKind::Private => self.reply(&msg, PRIVATE_SIGNAL_HINT).await,
                ChatKind::Channel => {}
            }
            return;
        }

        match Command::parse(text) {
            Ok(Some(command)) => self.handle_command(&msg, command).await,
            Ok(None) => debug!(chat_id = msg.chat_id, "ignoring non-command text"),
            Err(e) => self.reply(&msg, user_message(&e)).await,
        }
    }

    async fn handle_signal(&self, msg: &InboundMessage) {
        let signal = Signal {
            external_id: msg.sender_id,
            hint: msg.hint(),
            at: msg.timestamp,
        };

        match self.services.processor.submit(signal).await {
            Ok(receipt) => self.confirm(msg, &receipt).await,
            Err(RollcallError::WindowClosed) => {
                let text = match self.services.settings.window().await {
                    Ok(bounds) => format!(
                        "⏰ The attendance window is closed. Send '1' between {} and {}.",
                        bounds.start.format("%H:%M"),
                        bounds.end.format("%H:%M")
                    ),
                    Err(_) => "⏰ The attendance window is closed.".to_string(),
                };
                self.reply(msg, text).await;
            }
            Err(RollcallError::AlreadyRecorded { status }) => {
                self.reply(
                    msg,
                    format!("ℹ️ Your attendance for today is already recorded as {status}."),
                )
                .await;
            }
            Err(e) => {
                error!(member = msg.sender_id, error = %e, "attendance submission failed");
                self.reply(msg, SUBMISSION_FAILED).await;
            }
        }
    }

    /// Private greeting, falling back to the group and an admin notice.
    async fn confirm(&self, msg: &InboundMessage, receipt: &SubmissionReceipt) {
        let settings = &self.services.settings;
        let name = receipt.member.display_name();
        let time = to_local(msg.timestamp, settings.timezone())
            .format("%H:%M:%S")
            .to_string();
        let text = match (receipt.status, receipt.fine) {
            (AttendanceStatus::Present, _) => format!(
                "✅ Good morning, {name}! You are marked present for {} at {time}.",
                receipt.day
            ),
            (status, fine) => format!(
                "⚠️ {name}, you are marked {status} for {} at {time}. Fine: {}.",
                receipt.day,
                format_money(fine.unwrap_or_default(), settings.currency())
            ),
        };

        let private = OutboundMessage::text(msg.sender_id, text.clone());
        if let Err(e) = self.channel.send(private).await {
            warn!(member = msg.sender_id, error = %e, "private confirmation failed");
            self.reply(msg, text).await;
            self.notify_admins(format!(
                "⚠️ Could not send a private confirmation to {name} ({}). \
                 They need to open a chat with the bot and send /start.",
                msg.sender_id
            ))
            .await;
        }
    }

    async fn handle_command(&self, msg: &InboundMessage, command: Command) {
        if command.is_admin_only() && !self.is_admin(msg.sender_id) {
            warn!(sender = msg.sender_id, ?command, "admin command refused");
            self.reply(msg, NOT_AUTHORIZED).await;
            return;
        }

        debug!(sender = msg.sender_id, ?command, "running command");
        match self.execute(msg, command).await {
            Ok(Reply::Text(text)) => self.reply(msg, text).await,
            Ok(Reply::Document(file, caption)) => {
                self.save_export(&file);
                let mut out = OutboundMessage::document(msg.chat_id, file.into_document(caption));
                out.reply_to = Some(msg.id.clone());
                self.deliver(out).await;
            }
            Err(e) => self.reply(msg, user_message(&e)).await,
        }
    }

    async fn execute(
        &self,
        msg: &InboundMessage,
        command: Command,
    ) -> Result<Reply, RollcallError> {
        let s = &self.services;
        let currency = s.settings.currency();
        let tz = s.settings.timezone();

        let text = match command {
            Command::Start => {
                let member = s.ledger.get_or_create_member(msg.sender_id, &msg.hint()).await?;
                let bounds = s.settings.window().await?;
                format!(
                    "👋 Welcome, {}! Send '1' in the group between {} and {} every day to record \
                     your attendance. Use /fines to check your total.",
                    member.display_name(),
                    bounds.start.format("%H:%M"),
                    bounds.end.format("%H:%M")
                )
            }
            Command::Help => {
                if self.is_admin(msg.sender_id) {
                    format!("{MEMBER_HELP}\n\nAdmin commands:\n{ADMIN_HELP}")
                } else {
                    MEMBER_HELP.to_string()
                }
            }
            Command::Fines => match s.admin.member_total_fines(msg.sender_id).await {
                Ok(total) => format!("💰 Your total fines: {}", format_money(total, currency)),
                Err(RollcallError::MemberNotFound { .. }) => "💰 You have no fines.".to_string(),
                Err(e) => return Err(e),
            },
            Command::Report { day } => {
                let day = day.unwrap_or_else(|| self.today());
                let report = DailyReport::build(s.ledger.as_ref(), tz, day).await?;
                render_daily_report(&report, true, currency)
            }
            Command::Export { day } => {
                let day = day.unwrap_or_else(|| self.today());
                let file = export_daily_csv(s.ledger.as_ref(), tz, day).await?;
                return Ok(Reply::Document(file, format!("📎 Attendance export for {day}")));
            }
            Command::Monthly { year, month } => {
                let file = export_monthly_csv(s.ledger.as_ref(), year, month).await?;
                return Ok(Reply::Document(
                    file,
                    format!("📎 Monthly attendance for {year}-{month:02}"),
                ));
            }
            Command::SetFine { amount } => {
                s.admin.set_fine_amount(amount).await?;
                format!("✅ Fine amount set to {}.", format_money(amount, currency))
            }
            Command::SetWindow { start, end } => {
                s.admin.set_window(start, end).await?;
                format!(
                    "✅ Attendance window set to {}-{}. It applies from the next window.",
                    start.format("%H:%M"),
                    end.format("%H:%M")
                )
            }
            Command::SetReportTime { at } => {
                s.admin.set_report_time(at).await?;
                format!("✅ Daily report time set to {}.", at.format("%H:%M"))
            }
            Command::ForceMark {
                external_id,
                status,
                day,
            } => {
                let outcome = s.admin.force_mark(external_id, status, day).await?;
                let mut text = format!(
                    "✅ {} marked {} for {}.",
                    outcome.member.display_name(),
                    outcome.status,
                    outcome.day
                );
                if let Some(fine) = outcome.fine {
                    text.push_str(&format!(" Fine: {}.", format_money(fine, currency)));
                }
                text
            }
            Command::Activate { external_id } => {
                let member = s.admin.set_member_active(external_id, true).await?;
                format!("✅ {} is now active.", member.display_name())
            }
            Command::Deactivate { external_id } => {
                let member = s.admin.set_member_active(external_id, false).await?;
                format!(
                    "✅ {} is now inactive. Their history is kept.",
                    member.display_name()
                )
            }
            Command::Reconcile { day } => {
                let day = day.unwrap_or_else(|| self.today());
                if s.gate.accepts(s.clock.now()) == Some(day) {
                    return Err(RollcallError::InvalidInput(format!(
                        "The attendance window for {day} is still open. Reconcile after it closes."
                    )));
                }
                let summary = s.reconciler.reconcile(day).await?;
                format!(
                    "✅ Reconciled {day}: {} marked absent, {} already recorded.",
                    summary.marked_absent, summary.skipped
                )
            }
        };
        Ok(Reply::Text(text))
    }

    fn today(&self) -> NaiveDate {
        self.services.settings.today(self.services.clock.now())
    }

    fn save_export(&self, file: &ExportFile) {
        if let Some(dir) = &self.export_dir
            && let Err(e) = file.write_to(dir)
        {
            warn!(error = %e, "could not keep a copy of the export");
        }
    }

    async fn notify_admins(&self, text: String) {
        for &admin in &self.admin_ids {
            self.deliver(OutboundMessage::text(admin, text.clone())).await;
        }
    }

    async fn reply(&self, msg: &InboundMessage, text: impl Into<String>) {
        self.deliver(OutboundMessage::reply(msg, text)).await;
    }

    async fn deliver(&self, out: OutboundMessage) {
        let chat_id = out.chat_id;
        if let Err(e) = self.channel.send(out).await {
            warn!(chat_id, error = %e, "send failed");
        }
    }
}

/// Chat text for a failed command or submission.
fn user_message(err: &RollcallError) -> String {
    match err {
        RollcallError::InvalidInput(detail) => format!("❌ {detail}"),
        RollcallError::MemberNotFound { external_id } => {
            format!("❌ No member with id {external_id}.")
        }
        RollcallError::WindowClosed | RollcallError::AlreadyRecorded { .. } => {
            format!("❌ {err}")
        }
        other => {
            error!(error = %other, "command failed");
            COMMAND_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_hide_internal_detail() {
        assert_eq!(
            user_message(&RollcallError::InvalidInput("usage: /setfine <amount>".into())),
            "❌ usage: /setfine <amount>"
        );
        assert_eq!(
            user_message(&RollcallError::MemberNotFound { external_id: 9 }),
            "❌ No member with id 9."
        );
        assert_eq!(
            user_message(&RollcallError::store(std::io::Error::other("disk I/O error"))),
            COMMAND_FAILED
        );
    }
}
