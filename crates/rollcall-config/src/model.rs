// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Rollcall attendance service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Rollcall configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RollcallConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Window, fine, and export defaults.
    #[serde(default)]
    pub attendance: AttendanceConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name used in logs and the `/start` greeting.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "rollcall".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user ids allowed to run admin commands.
    #[serde(default)]
    pub admin_ids: Vec<i64>,

    /// Group that receives announcements and reports. Learned from the first
    /// group message when unset.
    #[serde(default)]
    pub group_chat_id: Option<i64>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Upper bound on any single ledger operation, in milliseconds.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("rollcall").join("rollcall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("rollcall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_operation_timeout_ms() -> u64 {
    10_000
}

/// Attendance window, fine, and export configuration.
///
/// `window_start`, `window_end`, `report_time` and `fine_amount` are defaults:
/// values stored through the admin commands take precedence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttendanceConfig {
    /// IANA timezone every time-of-day comparison is made in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Window opening time, `HH:MM` (inclusive).
    #[serde(default = "default_window_start")]
    pub window_start: String,

    /// Window closing time, `HH:MM` (exclusive).
    #[serde(default = "default_window_end")]
    pub window_end: String,

    /// Daily report time, `HH:MM`.
    #[serde(default = "default_report_time")]
    pub report_time: String,

    /// On-time cutoff, `HH:MM`. Defaults to the effective window end.
    #[serde(default)]
    pub deadline: Option<String>,

    /// Fine charged for a late or absent day.
    #[serde(default = "default_fine_amount")]
    pub fine_amount: f64,

    /// Currency symbol used in messages and reports.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Directory CSV exports are written to by the CLI.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            window_start: default_window_start(),
            window_end: default_window_end(),
            report_time: default_report_time(),
            deadline: None,
            fine_amount: default_fine_amount(),
            currency: default_currency(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_timezone() -> String {
    "Asia/Phnom_Penh".to_string()
}

fn default_window_start() -> String {
    "09:00".to_string()
}

fn default_window_end() -> String {
    "10:00".to_string()
}

fn default_report_time() -> String {
    "10:05".to_string()
}

fn default_fine_amount() -> f64 {
    20.0
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_export_dir() -> String {
    "exports".to_string()
}
