// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window Lifecycle Controller.
//!
//! `Closed -> Open -> Reconciling -> Reported`, once per day. Ledger work is
//! authoritative; announcements to the group are best-effort and a failed
//! send never undoes a write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rollcall_attendance::{
    AttendanceSettings, ReconcileSummary, Reconciler, WindowGate, WindowPhase,
};
use rollcall_core::{ChannelAdapter, GroupChat, LedgerStore, OutboundMessage, RollcallError};
use rollcall_report::{DailyReport, render_daily_report};
use tracing::{debug, error, info, warn};

use crate::scheduler::{Trigger, TriggerHandler};

pub const WINDOW_OPEN_TEXT: &str =
    "✅ Attendance window is now open! Send '1' to record your attendance.";

/// Reacts to scheduled triggers by moving the [`WindowGate`] through its phases.
pub struct WindowLifecycle {
    gate: Arc<WindowGate>,
    settings: Arc<AttendanceSettings>,
    reconciler: Arc<Reconciler>,
    ledger: Arc<dyn LedgerStore>,
    channel: Arc<dyn ChannelAdapter>,
    group: Arc<GroupChat>,
}

impl WindowLifecycle {
    pub fn new(
        gate: Arc<WindowGate>,
        settings: Arc<AttendanceSettings>,
        reconciler: Arc<Reconciler>,
        ledger: Arc<dyn LedgerStore>,
        channel: Arc<dyn ChannelAdapter>,
        group: Arc<GroupChat>,
    ) -> Self {
        Self {
            gate,
            settings,
            reconciler,
            ledger,
            channel,
            group,
        }
    }

    /// Open today's window and announce it.
    pub async fn on_window_start(&self, at: DateTime<Utc>) -> Result<NaiveDate, RollcallError> {
        let tz = self.settings.timezone();
        let day = self.settings.today(at);
        let bounds = self.settings.window().await?;
        self.gate.open(day, bounds.closes_at(day, tz));
        info!(%day, until = %bounds.end.format("%H:%M"), "attendance window opened");

        self.announce(format!(
            "{WINDOW_OPEN_TEXT} (until {})",
            bounds.end.format("%H:%M")
        ))
        .await;
        Ok(day)
    }

    /// Close the window, reconcile the day that was open, then announce.
    ///
    /// When no window was open (e.g. the process started after the start
    /// trigger and outside the window) the local day of `at` is reconciled.
    pub async fn on_window_end(
        &self,
        at: DateTime<Utc>,
    ) -> Result<ReconcileSummary, RollcallError> {
        let day = match self.gate.close() {
            Some(day) => day,
            None => {
                let day = self.settings.today(at);
                self.gate.begin_reconciling(day);
                day
            }
        };
        info!(%day, "attendance window closed");

        match self.reconciler.reconcile(day).await {
            Ok(summary) => {
                self.announce(format!(
                    "⏰ Attendance window is now closed. {} member(s) marked absent.",
                    summary.marked_absent
                ))
                .await;
                Ok(summary)
            }
            Err(e) => {
                self.announce("⏰ Attendance window is now closed.").await;
                Err(e)
            }
        }
    }

    /// Send the report for the day being reconciled (or today).
    pub async fn on_report(&self, at: DateTime<Utc>) -> Result<DailyReport, RollcallError> {
        let day = match self.gate.phase() {
            WindowPhase::Reconciling { day } => day,
            _ => self.settings.today(at),
        };
        let report =
            DailyReport::build(self.ledger.as_ref(), self.settings.timezone(), day).await?;
        self.announce(render_daily_report(&report, false, self.settings.currency()))
            .await;
        self.gate.mark_reported(day);
        info!(%day, "daily report sent");
        Ok(report)
    }

    async fn announce(&self, text: impl Into<String>) {
        let Some(chat_id) = self.group.get() else {
            debug!("no group chat known yet, announcement skipped");
            return;
        };
        if let Err(e) = self.channel.send(OutboundMessage::text(chat_id, text)).await {
            warn!(chat_id, error = %e, "announcement failed");
        }
    }
}

#[async_trait]
impl TriggerHandler for WindowLifecycle {
    async fn fire(&self, trigger: Trigger, at: DateTime<Utc>) {
        let result = match trigger {
            Trigger::WindowStart => self.on_window_start(at).await.map(|_| ()),
            Trigger::WindowEnd => self.on_window_end(at).await.map(|_| ()),
            Trigger::Report => self.on_report(at).await.map(|_| ()),
        };
        if let Err(e) = result {
            error!(%trigger, error = %e, "trigger handling failed");
        }
    }
}
