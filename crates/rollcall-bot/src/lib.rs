// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event loop for the Rollcall bot.
//!
//! [`BotLoop`] receives messages from a channel adapter and hands each one
//! to the [`MessageRouter`] on its own task, so a slow ledger write for one
//! member never delays another member's signal.

pub mod commands;
pub mod router;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use rollcall_core::{ChannelAdapter, RollcallError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

pub use commands::Command;
pub use router::{AttendanceServices, MessageRouter};

/// How long shutdown waits for in-flight messages.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BotLoop {
    channel: Arc<dyn ChannelAdapter>,
    router: Arc<MessageRouter>,
    tasks: TaskTracker,
}

impl BotLoop {
    pub fn new(channel: Arc<dyn ChannelAdapter>, router: Arc<MessageRouter>) -> Self {
        Self {
            channel,
            router,
            tasks: TaskTracker::new(),
        }
    }

    /// Runs until `cancel` fires or the channel closes, then drains
    /// in-flight messages.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RollcallError> {
        info!("bot loop running");

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            let router = self.router.clone();
                            self.tasks.spawn(async move { router.handle(inbound).await });
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error, stopping bot loop");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bot loop");
                    break;
                }
            }
        }

        shutdown::drain_tasks(&self.tasks, DRAIN_TIMEOUT).await;
        info!("bot loop stopped");
        Ok(())
    }
}
