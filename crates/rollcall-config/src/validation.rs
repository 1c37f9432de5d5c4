// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! parseable times, a known timezone, a well-ordered window, and a usable fine.

use chrono::NaiveTime;

use crate::diagnostic::ConfigError;
use crate::model::RollcallConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Parses an `HH:MM` time of day.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every violation found rather than stopping at the first.
pub fn validate_config(config: &RollcallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let attendance = &config.attendance;

    if !LOG_LEVELS.contains(&config.service.log_level.to_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if attendance.timezone.parse::<chrono_tz::Tz>().is_err() {
        errors.push(ConfigError::validation(format!(
            "attendance.timezone `{}` is not a known IANA timezone",
            attendance.timezone
        )));
    }

    let mut time_field = |name: &str, value: &str| {
        let parsed = parse_hhmm(value);
        if parsed.is_none() {
            errors.push(ConfigError::validation(format!(
                "attendance.{name} `{value}` is not a valid HH:MM time"
            )));
        }
        parsed
    };
    let start = time_field("window_start", &attendance.window_start);
    let end = time_field("window_end", &attendance.window_end);
    time_field("report_time", &attendance.report_time);
    if let Some(deadline) = &attendance.deadline {
        time_field("deadline", deadline);
    }

    if let (Some(start), Some(end)) = (start, end)
        && start >= end
    {
        errors.push(ConfigError::validation(format!(
            "attendance.window_start ({}) must be earlier than attendance.window_end ({})",
            attendance.window_start, attendance.window_end
        )));
    }

    if !attendance.fine_amount.is_finite() || attendance.fine_amount < 0.0 {
        errors.push(ConfigError::validation(format!(
            "attendance.fine_amount must be a non-negative number, got {}",
            attendance.fine_amount
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.storage.operation_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "storage.operation_timeout_ms must be greater than zero",
        ));
    }

    if config.telegram.admin_ids.contains(&0) {
        errors.push(ConfigError::validation(
            "telegram.admin_ids must not contain 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
