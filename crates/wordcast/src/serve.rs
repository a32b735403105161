// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wordcast serve` command implementation.
//!
//! Opens storage, builds the configured channel, and runs the periodic
//! scheduler/dispatcher next to the HTTP gateway until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use wordcast_config::model::{ChannelKind, WordcastConfig};
use wordcast_core::{ChannelAdapter, PluginAdapter, StorageAdapter, WordcastError};
use wordcast_gateway::GatewayState;
use wordcast_scheduler::{DailyScheduler, OutboxDispatcher, ScheduleRunner};
use wordcast_sms::SmsChannel;
use wordcast_storage::SqliteStorage;
use wordcast_whatsapp::WhatsAppChannel;

use crate::shutdown;

/// Open and migrate the configured SQLite database.
pub async fn open_storage(config: &WordcastConfig) -> Result<Arc<dyn StorageAdapter>, WordcastError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Build the channel selected by `[channel] kind`.
pub fn build_channel(config: &WordcastConfig) -> Result<Arc<dyn ChannelAdapter>, WordcastError> {
    let channel: Arc<dyn ChannelAdapter> = match config.channel.kind {
        ChannelKind::Whatsapp => Arc::new(WhatsAppChannel::new(&config.whatsapp)?),
        ChannelKind::Sms => Arc::new(SmsChannel::new(&config.sms)?),
    };
    info!(channel = channel.name(), "channel ready");
    Ok(channel)
}

/// Runs the `wordcast serve` command.
pub async fn run_serve(config: WordcastConfig) -> Result<(), WordcastError> {
    info!(name = %config.service.name, "starting wordcast serve");

    let storage = open_storage(&config).await?;
    let channel = build_channel(&config)?;

    let scheduler = Arc::new(DailyScheduler::new(storage.clone(), &config.schedule)?);
    let dispatcher = Arc::new(OutboxDispatcher::new(
        storage.clone(),
        channel.clone(),
        &config.dispatch,
    ));
    let run_time = config.schedule.run_time().ok_or_else(|| {
        WordcastError::Config(format!(
            "schedule.daily_run_time `{}` is not HH:MM",
            config.schedule.daily_run_time
        ))
    })?;
    let runner = ScheduleRunner::new(
        scheduler.clone(),
        dispatcher.clone(),
        Duration::from_secs(config.dispatch.interval_secs.max(1)),
        run_time,
    );

    let cancel = shutdown::install_signal_handler();

    let gateway = if config.gateway.enabled {
        if config.gateway.bearer_token.is_none() {
            warn!("gateway.bearer_token is not set; trigger routes will reject every request");
        }
        let state = GatewayState::new(storage.clone(), scheduler, dispatcher, &config);
        let gateway_config = config.gateway.clone();
        let gateway_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            let result =
                wordcast_gateway::start_server(&gateway_config, state, gateway_cancel.clone())
                    .await;
            // A gateway that fails to start stops the service.
            if result.is_err() {
                gateway_cancel.cancel();
            }
            result
        }))
    } else {
        info!("gateway disabled by configuration");
        None
    };

    runner.run(cancel.clone()).await;

    if let Some(handle) = gateway {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "gateway exited with error"),
            Err(e) => error!(error = %e, "gateway task panicked"),
        }
    }

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    storage.close().await?;
    info!("wordcast stopped");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wordcast={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
