// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Telegram updates into channel-agnostic messages.
//!
//! Only text messages from human senders are forwarded; everything else
//! (stickers, service messages, other bots, channel posts) is dropped here.

use rollcall_core::{ChatKind, InboundMessage};
use teloxide::types::{Chat, Message};

/// Classifies a Telegram chat. Groups and supergroups are both `Group`.
pub fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    }
}

/// Whether the message was sent by a bot account.
pub fn is_from_bot(msg: &Message) -> bool {
    msg.from.as_ref().is_some_and(|u| u.is_bot)
}

/// Converts a Telegram message into an [`InboundMessage`].
///
/// Returns `None` for messages without text or without a human sender.
pub fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?;
    let user = msg.from.as_ref().filter(|u| !u.is_bot)?;
    let sender_id = i64::try_from(user.id.0).ok()?;

    let full_name = user.full_name();
    Some(InboundMessage {
        id: msg.id.0.to_string(),
        chat_id: msg.chat.id.0,
        chat_kind: chat_kind(&msg.chat),
        sender_id,
        sender_username: user.username.clone(),
        sender_name: (!full_name.trim().is_empty()).then_some(full_name),
        text: text.to_string(),
        timestamp: msg.date,
    })
}
