// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for Rollcall.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for inbound text, plain-text replies and CSV documents
//! outbound.

pub mod handler;

use async_trait::async_trait;
use rollcall_config::TelegramConfig;
use rollcall_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundMessage, MessageId, OutboundMessage,
    PluginAdapter, RollcallError,
};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ReplyParameters};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, RollcallError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RollcallError::Config("telegram.bot_token is required to serve".into())
        })?;

        if token.trim().is_empty() {
            return Err(RollcallError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, RollcallError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RollcallError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), RollcallError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    match handler::to_inbound_message(&msg) {
                        Some(inbound) => {
                            if tx.send(inbound).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => debug!(
                            msg_id = msg.id.0,
                            chat_id = msg.chat.id.0,
                            "ignoring non-text or bot message"
                        ),
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, RollcallError> {
        let chat_id = ChatId(msg.chat_id);
        let reply_to = reply_target(msg.reply_to.as_deref());

        let sent = match msg.document {
            Some(doc) => {
                let file = InputFile::memory(doc.bytes).file_name(doc.file_name);
                let mut request = self.bot.send_document(chat_id, file);
                if let Some(caption) = doc.caption {
                    request = request.caption(caption);
                }
                if let Some(id) = reply_to {
                    request = request.reply_parameters(ReplyParameters::new(id));
                }
                request.await
            }
            None => {
                let mut request = self.bot.send_message(chat_id, msg.content);
                if let Some(id) = reply_to {
                    request = request.reply_parameters(ReplyParameters::new(id));
                }
                request.await
            }
        }
        .map_err(|e| RollcallError::Channel {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, RollcallError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| RollcallError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}

/// Parses a reply target id; unparseable ids send without a reply.
fn reply_target(id: Option<&str>) -> Option<teloxide::types::MessageId> {
    id.and_then(|s| s.parse::<i32>().ok())
        .map(teloxide::types::MessageId)
}
