// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the attendance services from configuration.

use std::sync::Arc;

use chrono::NaiveDate;
use rollcall_attendance::{
    AdminService, AttendanceSettings, Reconciler, SettingsDefaults, SubmissionProcessor,
    WindowGate,
};
use rollcall_bot::AttendanceServices;
use rollcall_config::RollcallConfig;
use rollcall_core::{Clock, LedgerStore, RollcallError, SystemClock};
use rollcall_storage::SqliteLedger;
use tracing::info;

pub struct Stack {
    pub ledger: Arc<dyn LedgerStore>,
    pub settings: Arc<AttendanceSettings>,
    pub gate: Arc<WindowGate>,
    pub processor: Arc<SubmissionProcessor>,
    pub reconciler: Arc<Reconciler>,
    pub admin: Arc<AdminService>,
    pub clock: Arc<dyn Clock>,
}

impl Stack {
    /// Opens the ledger and seeds the window gate from the wall clock.
    pub async fn open(config: &RollcallConfig) -> Result<Self, RollcallError> {
        let ledger: Arc<dyn LedgerStore> =
            Arc::new(SqliteLedger::open(config.storage.clone()).await?);
        info!(path = %config.storage.database_path, "ledger opened");

        let defaults = SettingsDefaults::from_config(&config.attendance)?;
        let timezone = defaults.timezone;
        let settings = Arc::new(AttendanceSettings::new(ledger.clone(), defaults));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let bounds = settings.window().await?;
        let gate = Arc::new(WindowGate::bootstrap(clock.now(), &bounds, timezone));

        Ok(Self {
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
            ledger,
            settings,
            gate,
            clock,
        })
    }

    pub fn services(&self) -> AttendanceServices {
        AttendanceServices {
            ledger: self.ledger.clone(),
            settings: self.settings.clone(),
            processor: self.processor.clone(),
            reconciler: self.reconciler.clone(),
            admin: self.admin.clone(),
            gate: self.gate.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.settings.today(self.clock.now())
    }
}
