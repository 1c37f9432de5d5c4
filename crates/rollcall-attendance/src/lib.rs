// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attendance rules for Rollcall.
//!
//! The window calculator and [`WindowGate`] decide when signals count; the
//! [`SubmissionProcessor`], [`Reconciler`] and [`AdminService`] write through
//! the ledger trait and never touch storage directly.

pub mod admin;
pub mod clock;
pub mod processor;
pub mod reconcile;
pub mod settings;
pub mod window;

pub use admin::{AdminService, ForceMarkOutcome, ForcedStatus};
pub use clock::WindowBounds;
pub use processor::{Signal, SubmissionProcessor, SubmissionReceipt};
pub use reconcile::{ReconcileSummary, Reconciler};
pub use settings::{AttendanceSettings, SettingsDefaults};
pub use window::{WindowGate, WindowPhase};
