// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rollcall serve`: Telegram bot plus the daily window scheduler.

use std::sync::Arc;

use rollcall_bot::shutdown;
use rollcall_bot::{BotLoop, MessageRouter};
use rollcall_config::RollcallConfig;
use rollcall_core::{ChannelAdapter, GroupChat, HealthStatus, PluginAdapter, RollcallError};
use rollcall_cron::{CronScheduler, WindowLifecycle};
use rollcall_telegram::TelegramChannel;
use tracing::{error, info, warn};

use crate::stack::Stack;

pub async fn run_serve(config: RollcallConfig) -> Result<(), RollcallError> {
    let stack = Stack::open(&config).await?;

    let mut telegram = TelegramChannel::new(&config.telegram)?;
    telegram.connect().await?;
    match telegram.health_check().await {
        Ok(HealthStatus::Healthy) => info!("Telegram channel connected"),
        Ok(status) => warn!(?status, "Telegram channel degraded at startup"),
        Err(e) => warn!(error = %e, "Telegram health check failed"),
    }
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    let group = Arc::new(GroupChat::new(config.telegram.group_chat_id));
    if group.get().is_none() {
        info!("no group chat configured, waiting for the first group message");
    }
    if config.telegram.admin_ids.is_empty() {
        warn!("telegram.admin_ids is empty, admin commands are disabled");
    }

    let router = Arc::new(
        MessageRouter::new(
            stack.services(),
            channel.clone(),
            group.clone(),
            config.telegram.admin_ids.iter().copied(),
        )
        .with_export_dir(&config.attendance.export_dir),
    );

    let lifecycle = Arc::new(WindowLifecycle::new(
        stack.gate.clone(),
        stack.settings.clone(),
        stack.reconciler.clone(),
        stack.ledger.clone(),
        channel.clone(),
        group,
    ));

    let cancel = shutdown::install_signal_handler();

    let scheduler = CronScheduler::new(stack.settings.clone(), lifecycle, stack.clock.clone());
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    info!(phase = ?stack.gate.phase(), "rollcall serving");
    BotLoop::new(channel.clone(), router).run(cancel.clone()).await?;

    // The bot loop also stops when the channel closes.
    cancel.cancel();
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "scheduler task panicked");
    }
    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    stack.ledger.close().await?;

    info!("rollcall serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rollcall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
