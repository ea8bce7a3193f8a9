//! Agent binary: long-polls the bot, dispatches commands, shows popups.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use subscriber_store::{JsonFileStore, SubscriberRegistry};
use telegram_client::BotApiClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use desk_relay_lib::dispatch::Dispatcher;
use desk_relay_lib::event_loop::EventLoop;
use desk_relay_lib::fetcher::UpdateFetcher;
use desk_relay_lib::notification::{NotificationScheduler, SchedulerConfig, TracingRenderer};
use desk_relay_lib::power::{PowerScheduler, SystemPowerExecutor};
use desk_relay_lib::{inbox, outbox, shutdown, system_info};

/// How long queued replies get to drain after the loop stops.
const OUTBOX_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Foundation
    let (config, dir) = desk_relay_lib::init_foundation()?;
    tracing::info!(
        device = %config.device_name,
        os = %system_info::os_name(),
        ip = %system_info::local_ip(),
        data_dir = %dir.display(),
        "Starting desk-relay agent"
    );

    let client = BotApiClient::new(&config.api_base_url, &config.bot_token)
        .context("Failed to create Bot API client")?;

    let store = JsonFileStore::new(&config.subscribers_file);
    let registry = SubscriberRegistry::open(Box::new(store), &config.admin_chat_id)
        .context("Failed to open subscriber registry")?;
    tracing::info!(
        subscribers = registry.len(),
        file = %config.subscribers_file.display(),
        "Subscriber registry loaded"
    );

    // Outbound worker
    let (outbox, outbox_rx) = outbox::channel();
    let outbox_worker = tokio::spawn(outbox::run_outbox_worker(outbox_rx, client.clone()));

    // Power + notifications
    let executor = Arc::new(SystemPowerExecutor::new(config.power_dry_run));
    let power = PowerScheduler::new(executor, config.power_grace);
    let scheduler = NotificationScheduler::new(
        TracingRenderer::new(),
        SchedulerConfig {
            lifetime: config.notification_lifetime,
            animation: config.notification_animation,
        },
    );

    let dispatcher = Dispatcher::new(
        config.admin_chat_id.clone(),
        config.device_name.clone(),
        registry,
        outbox,
        power,
    );

    // Signals
    let cancel = CancellationToken::new();
    shutdown::spawn_signal_listener(cancel.clone());

    // Update fetcher
    let (inbox_tx, inbox_rx) = inbox::channel();
    let fetcher = UpdateFetcher::new(client, config.poll_timeout_secs, config.poll_backoff_max);
    let fetcher_handle = tokio::spawn(fetcher.run(inbox_tx, cancel.clone()));

    // Cooperative loop
    let mut event_loop = EventLoop::new(inbox_rx, dispatcher, scheduler, config.tick_interval)
        .with_fetcher(fetcher_handle);
    event_loop.announce_startup();
    tracing::info!("Agent running. Press Ctrl+C to stop.");
    event_loop.run(&cancel).await;

    // Dropping the loop drops the last outbox sender; the worker drains and exits.
    drop(event_loop);
    match tokio::time::timeout(OUTBOX_DRAIN_TIMEOUT, outbox_worker).await {
        Ok(Ok(())) => tracing::info!("Outbox drained"),
        Ok(Err(e)) => tracing::warn!("Outbox worker failed: {e}"),
        Err(_) => tracing::warn!("Outbox did not drain within {OUTBOX_DRAIN_TIMEOUT:?}"),
    }

    tracing::info!("Agent stopped");
    Ok(())
}
