// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain and transport types shared across the Rollcall workspace.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a sent message, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

// --- Ledger entities ---

/// Attendance outcome for one member on one day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Signalled before the deadline.
    Present,
    /// Signalled inside the window but at or after the deadline.
    Late,
    /// No signal, or marked absent by an administrator.
    Absent,
}

impl AttendanceStatus {
    /// Whether this status carries a fine.
    pub fn is_fined(self) -> bool {
        !matches!(self, Self::Present)
    }
}

/// A member of the tracked group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Ledger row id.
    pub id: i64,
    /// Transport identity (e.g. Telegram user id).
    pub external_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Name used in reports and replies: full name, then `@username`, then the id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return format!("@{username}");
        }
        format!("User {}", self.external_id)
    }
}

/// Identity details observed on a signal, used to create or refresh a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberHint {
    pub username: Option<String>,
    pub full_name: Option<String>,
}

/// One attendance record per (member, day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_id: i64,
    pub day: NaiveDate,
    pub status: AttendanceStatus,
    /// Signal instant; `None` for absences.
    pub signal_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One fine per (member, day). Amount is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fine {
    pub member_id: i64,
    pub day: NaiveDate,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// A record (and optional fine) to be created atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub member_id: i64,
    pub day: NaiveDate,
    pub status: AttendanceStatus,
    pub signal_at: Option<DateTime<Utc>>,
    pub fine: Option<f64>,
}

/// Result of a conditional create against the (member, day) uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record (and fine, if any) were written.
    Created,
    /// A record already existed; nothing was written.
    Conflict(AttendanceStatus),
}

// --- Transport types ---

/// Kind of chat a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

/// An inbound text message received from a channel adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Transport message id.
    pub id: String,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub sender_id: i64,
    pub sender_username: Option<String>,
    pub sender_name: Option<String>,
    pub text: String,
    /// Transport-reported send time.
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    /// Identity hint carried by this message.
    pub fn hint(&self) -> MemberHint {
        MemberHint {
            username: self.sender_username.clone(),
            full_name: self.sender_name.clone(),
        }
    }
}

/// A file attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub caption: Option<String>,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub content: String,
    /// Transport message id this replies to, if any.
    pub reply_to: Option<String>,
    pub document: Option<Document>,
}

impl OutboundMessage {
    /// Plain text message to a chat.
    pub fn text(chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: content.into(),
            reply_to: None,
            document: None,
        }
    }

    /// Text reply to a specific inbound message.
    pub fn reply(to: &InboundMessage, content: impl Into<String>) -> Self {
        Self {
            chat_id: to.chat_id,
            content: content.into(),
            reply_to: Some(to.id.clone()),
            document: None,
        }
    }

    /// Document upload with the caption doubling as message text.
    pub fn document(chat_id: i64, document: Document) -> Self {
        Self {
            chat_id,
            content: document.caption.clone().unwrap_or_default(),
            reply_to: None,
            document: Some(document),
        }
    }
}

/// The group chat that receives window announcements and reports.
///
/// Seeded from configuration, or learned from the first group message.
#[derive(Debug, Default)]
pub struct GroupChat {
    id: ArcSwapOption<i64>,
}

impl GroupChat {
    pub fn new(id: Option<i64>) -> Self {
        Self {
            id: ArcSwapOption::new(id.map(Arc::new)),
        }
    }

    pub fn get(&self) -> Option<i64> {
        self.id.load().as_deref().copied()
    }

    /// Records `id`, returning `true` when it differs from the previous value.
    pub fn remember(&self, id: i64) -> bool {
        let previous = self.id.swap(Some(Arc::new(id)));
        previous.as_deref() != Some(&id)
    }
}
