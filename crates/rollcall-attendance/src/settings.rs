// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-through settings.
//!
//! Values stored in the ledger override the configured defaults. A stored
//! value that no longer parses is logged and the default applies.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use rollcall_config::AttendanceConfig;
use rollcall_core::{LedgerStore, RollcallError};
use tracing::{info, warn};

use crate::clock::{WindowBounds, local_day, parse_time_of_day, parse_timezone};

pub const FINE_AMOUNT_KEY: &str = "fine_amount";
pub const WINDOW_START_KEY: &str = "window_start";
pub const WINDOW_END_KEY: &str = "window_end";
pub const REPORT_TIME_KEY: &str = "report_time";

/// Compiled-in or configured fallbacks for every persisted setting.
#[derive(Debug, Clone)]
pub struct SettingsDefaults {
    pub timezone: Tz,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub report_time: NaiveTime,
    /// Fixed on-time cutoff; `None` means "the effective window end".
    pub deadline: Option<NaiveTime>,
    pub fine_amount: f64,
    pub currency: String,
}

impl SettingsDefaults {
    pub fn from_config(config: &AttendanceConfig) -> Result<Self, RollcallError> {
        let time = |name: &str, value: &str| {
            parse_time_of_day(value).map_err(|_| {
                RollcallError::Config(format!("attendance.{name} `{value}` is not HH:MM"))
            })
        };
        Ok(Self {
            timezone: parse_timezone(&config.timezone)?,
            window_start: time("window_start", &config.window_start)?,
            window_end: time("window_end", &config.window_end)?,
            report_time: time("report_time", &config.report_time)?,
            deadline: config
                .deadline
                .as_deref()
                .map(|d| time("deadline", d))
                .transpose()?,
            fine_amount: config.fine_amount,
            currency: config.currency.clone(),
        })
    }
}

/// Resolves effective settings against the ledger.
pub struct AttendanceSettings {
    ledger: Arc<dyn LedgerStore>,
    defaults: SettingsDefaults,
}

impl AttendanceSettings {
    pub fn new(ledger: Arc<dyn LedgerStore>, defaults: SettingsDefaults) -> Self {
        Self { ledger, defaults }
    }

    pub fn timezone(&self) -> Tz {
        self.defaults.timezone
    }

    pub fn currency(&self) -> &str {
        &self.defaults.currency
    }

    /// Local calendar day of `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        local_day(now, self.defaults.timezone)
    }

    /// Fine charged for a late or absent day, as of this call.
    pub async fn fine_amount(&self) -> Result<f64, RollcallError> {
        let stored = self.ledger.get_setting(FINE_AMOUNT_KEY).await?;
        Ok(stored
            .and_then(|raw| match parse_amount(&raw) {
                Ok(amount) => Some(amount),
                Err(e) => {
                    warn!(key = FINE_AMOUNT_KEY, value = %raw, error = %e, "ignoring stored setting");
                    None
                }
            })
            .unwrap_or(self.defaults.fine_amount))
    }

    /// Effective window bounds and deadline.
    pub async fn window(&self) -> Result<WindowBounds, RollcallError> {
        let stored = self
            .ledger
            .get_settings(&[WINDOW_START_KEY, WINDOW_END_KEY])
            .await?;
        let [start, end]: [Option<String>; 2] = stored.try_into().unwrap_or_default();
        let start = parse_stored(WINDOW_START_KEY, start).unwrap_or(self.defaults.window_start);
        let end = parse_stored(WINDOW_END_KEY, end).unwrap_or(self.defaults.window_end);
        let deadline = |end| self.defaults.deadline.unwrap_or(end);

        match WindowBounds::new(start, end, deadline(end)) {
            Ok(bounds) => Ok(bounds),
            Err(e) => {
                warn!(error = %e, "stored window is inconsistent, using configured window");
                WindowBounds::new(
                    self.defaults.window_start,
                    self.defaults.window_end,
                    deadline(self.defaults.window_end),
                )
            }
        }
    }

    pub async fn report_time(&self) -> Result<NaiveTime, RollcallError> {
        Ok(self
            .stored_time(REPORT_TIME_KEY)
            .await?
            .unwrap_or(self.defaults.report_time))
    }

    pub async fn set_fine_amount(&self, amount: f64) -> Result<(), RollcallError> {
        validate_amount(amount)?;
        self.ledger
            .put_setting(FINE_AMOUNT_KEY, &amount.to_string())
            .await?;
        info!(amount, "fine amount updated");
        Ok(())
    }

    pub async fn set_window(&self, start: NaiveTime, end: NaiveTime) -> Result<(), RollcallError> {
        WindowBounds::new(start, end, end)?;
        let start_text = start.format("%H:%M").to_string();
        let end_text = end.format("%H:%M").to_string();
        self.ledger
            .put_settings(&[
                (WINDOW_START_KEY, start_text.as_str()),
                (WINDOW_END_KEY, end_text.as_str()),
            ])
            .await?;
        info!(start = %start.format("%H:%M"), end = %end.format("%H:%M"), "window updated");
        Ok(())
    }

    pub async fn set_report_time(&self, at: NaiveTime) -> Result<(), RollcallError> {
        self.ledger
            .put_setting(REPORT_TIME_KEY, &at.format("%H:%M").to_string())
            .await?;
        info!(report_time = %at.format("%H:%M"), "report time updated");
        Ok(())
    }

    async fn stored_time(&self, key: &str) -> Result<Option<NaiveTime>, RollcallError> {
        Ok(parse_stored(key, self.ledger.get_setting(key).await?))
    }
}

fn validate_amount(amount: f64) -> Result<(), RollcallError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(RollcallError::InvalidInput(format!(
            "fine amount must be a non-negative number, got {amount}"
        )))
    }
}

/// Parse a fine amount, accepting an optional leading currency symbol.
pub fn parse_amount(raw: &str) -> Result<f64, RollcallError> {
    let trimmed = raw.trim().trim_start_matches('$');
    let amount: f64 = trimmed
        .parse()
        .map_err(|_| RollcallError::InvalidInput(format!("`{raw}` is not a number")))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn parse_stored(key: &str, raw: Option<String>) -> Option<NaiveTime> {
    let raw = raw?;
    match parse_time_of_day(&raw) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring stored setting");
            None
        }
    }
}
