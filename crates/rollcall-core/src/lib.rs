// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Rollcall attendance service.
//!
//! This crate provides the error type, domain types, and adapter traits used
//! throughout the workspace. The ledger and transport implementations live
//! in their own crates and implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RollcallError;
pub use types::{
    AdapterType, AttendanceRecord, AttendanceStatus, ChatKind, CreateOutcome, Document, Fine,
    GroupChat, HealthStatus, InboundMessage, Member, MemberHint, MessageId, NewRecord,
    OutboundMessage,
};

pub use traits::{ChannelAdapter, Clock, LedgerStore, PluginAdapter, SystemClock};
