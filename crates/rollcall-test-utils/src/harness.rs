// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end attendance scenarios.
//!
//! `TestHarness` assembles the attendance services over a temp SQLite
//! ledger, a [`MockChannel`] and a [`ManualClock`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rollcall_attendance::clock::assume_local;
use rollcall_attendance::{
    AdminService, AttendanceSettings, Reconciler, SettingsDefaults, Signal, SubmissionProcessor,
    WindowGate,
};
use rollcall_config::{AttendanceConfig, StorageConfig};
use rollcall_core::{
    ChatKind, Clock, GroupChat, InboundMessage, LedgerStore, MemberHint, RollcallError,
};
use rollcall_storage::SqliteLedger;

use crate::clock::ManualClock;
use crate::mock_channel::MockChannel;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    attendance: AttendanceConfig,
    group_chat_id: Option<i64>,
    start: Option<DateTime<Utc>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            attendance: AttendanceConfig::default(),
            group_chat_id: None,
            start: None,
        }
    }

    pub fn with_attendance(mut self, attendance: AttendanceConfig) -> Self {
        self.attendance = attendance;
        self
    }

    /// Pre-seed the known group chat.
    pub fn with_group(mut self, chat_id: i64) -> Self {
        self.group_chat_id = Some(chat_id);
        self
    }

    /// Initial clock reading; the gate is bootstrapped from it.
    pub fn starting_at(mut self, now: DateTime<Utc>) -> Self {
        self.start = Some(now);
        self
    }

    pub async fn build(self) -> Result<TestHarness, RollcallError> {
        let temp_dir = tempfile::TempDir::new().map_err(RollcallError::store)?;
        let storage = StorageConfig {
            database_path: temp_dir
                .path()
                .join("rollcall.db")
                .to_string_lossy()
                .into_owned(),
            ..StorageConfig::default()
        };
        let ledger: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::open(storage).await?);

        let defaults = SettingsDefaults::from_config(&self.attendance)?;
        let timezone = defaults.timezone;
        let settings = Arc::new(AttendanceSettings::new(ledger.clone(), defaults));
        let clock = Arc::new(ManualClock::new(self.start.unwrap_or_else(Utc::now)));

        let bounds = settings.window().await?;
        let gate = Arc::new(WindowGate::bootstrap(
            clock.now(),
            &bounds,
            timezone,
        ));

        Ok(TestHarness {
            processor: Arc::new(SubmissionProcessor::new(
                ledger.clone(),
                gate.clone(),
                settings.clone(),
            )),
            reconciler: Arc::new(Reconciler::new(ledger.clone(), settings.clone())),
            admin: Arc::new(AdminService::new(
                ledger.clone(),
                settings.clone(),
                clock.clone(),
            )),
            channel: Arc::new(MockChannel::new()),
            group: Arc::new(GroupChat::new(self.group_chat_id)),
            ledger,
            settings,
            gate,
            clock,
            timezone,
            attendance: self.attendance,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete attendance environment with mock channel and temp storage.
pub struct TestHarness {
    pub ledger: Arc<dyn LedgerStore>,
    pub settings: Arc<AttendanceSettings>,
    pub gate: Arc<WindowGate>,
    pub processor: Arc<SubmissionProcessor>,
    pub reconciler: Arc<Reconciler>,
    pub admin: Arc<AdminService>,
    pub channel: Arc<MockChannel>,
    pub group: Arc<GroupChat>,
    pub clock: Arc<ManualClock>,
    pub timezone: Tz,
    pub attendance: AttendanceConfig,
    /// Kept alive so the database outlives the harness.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Instant of a local wall-clock time in the harness timezone.
    pub fn local(&self, day: NaiveDate, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        local_instant(self.timezone, day, h, m, s)
    }

    /// Open the gate for `day` using the effective window.
    pub async fn open_window(&self, day: NaiveDate) -> Result<(), RollcallError> {
        let bounds = self.settings.window().await?;
        self.gate.open(day, bounds.closes_at(day, self.timezone));
        Ok(())
    }

    /// Submit a signal for `external_id` at the current clock reading.
    pub async fn signal(
        &self,
        external_id: i64,
    ) -> Result<rollcall_attendance::SubmissionReceipt, RollcallError> {
        self.processor
            .submit(Signal {
                external_id,
                hint: MemberHint {
                    username: Some(format!("user{external_id}")),
                    full_name: None,
                },
                at: self.clock.now(),
            })
            .await
    }
}

/// Instant of local wall-clock `h:m:s` on `day` in `tz`.
pub fn local_instant(tz: Tz, day: NaiveDate, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    match day.and_hms_opt(h, m, s) {
        Some(naive) => assume_local(naive, tz),
        None => panic!("invalid wall-clock time {h}:{m}:{s}"),
    }
}

/// An inbound text message from `sender_id` in `chat_id`.
pub fn inbound(
    chat_id: i64,
    chat_kind: ChatKind,
    sender_id: i64,
    text: &str,
    at: DateTime<Utc>,
) -> InboundMessage {
    InboundMessage {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id,
        chat_kind,
        sender_id,
        sender_username: Some(format!("user{sender_id}")),
        sender_name: Some(format!("Member {sender_id}")),
        text: text.to_string(),
        timestamp: at,
    }
}
