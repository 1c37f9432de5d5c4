// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Rollcall attendance service.

use thiserror::Error;

use crate::types::AttendanceStatus;

/// The primary error type used across all Rollcall adapter traits and core operations.
#[derive(Debug, Error)]
pub enum RollcallError {
    /// The attendance window is not accepting signals. Not retried; the member
    /// must resend inside the next window.
    #[error("attendance window is closed")]
    WindowClosed,

    /// A record already exists for this member and day. Terminal for the day.
    #[error("attendance already recorded for today as {status}")]
    AlreadyRecorded { status: AttendanceStatus },

    /// No member is registered under the given external id.
    #[error("member {external_id} not found")]
    MemberNotFound { external_id: i64 },

    /// The ledger could not be reached, timed out, or failed mid-operation.
    ///
    /// User submissions are never retried automatically. Reconciliation is
    /// idempotent, so its next invocation acts as the retry.
    #[error("store unavailable: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport errors (connection failure, rejected send, closed inbound stream).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operator or member supplied an argument that cannot be used.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RollcallError {
    /// Wraps any store-side failure.
    pub fn store(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::StoreUnavailable {
            source: source.into(),
        }
    }

    /// Returns `true` for failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Returns `true` for rejections that should be shown to the member verbatim.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::WindowClosed | Self::AlreadyRecorded { .. } | Self::MemberNotFound { .. }
        )
    }
}
