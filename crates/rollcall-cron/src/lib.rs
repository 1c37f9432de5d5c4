// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled window lifecycle for Rollcall.
//!
//! [`CronScheduler`] turns the effective window and report times into
//! daily firings; [`WindowLifecycle`] reacts to them.

pub mod lifecycle;
pub mod scheduler;

pub use lifecycle::WindowLifecycle;
pub use scheduler::{CronScheduler, Schedule, Trigger, TriggerHandler, daily_pattern, next_fire};
