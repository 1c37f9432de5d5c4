// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the message transport.

use async_trait::async_trait;

use crate::error::RollcallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MessageId, OutboundMessage};

/// Adapter for a bidirectional messaging transport.
///
/// Sends are best-effort from the attendance core's point of view: a failed
/// send is logged by the caller and never undoes a ledger write.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), RollcallError>;

    /// Sends a message (and optional document) through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, RollcallError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, RollcallError>;
}
