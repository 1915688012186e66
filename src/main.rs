//! Lutrabot - Twitch/Mixer chat relay
//!
//! Relays chat between the bot's channels on both services, with an optional
//! coop session that links two Twitch channels and the Mixer channel.

mod bridge;
mod common;
mod config;
mod format;
mod platform;

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio::signal;
use tracing::{debug, error, info, warn};

use bridge::{spawn_dispatcher, spawn_forwarder, ChannelBundle, RelayEngine, RelayRouter};
use config::{env::get_config_path, load_and_validate, Config};
use format::EmoteTranslator;
use platform::{AdapterMap, ConsoleSource, HttpUserLookup, LogAdapter, PlatformAdapter, UserLookup};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Lutrabot v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let (config, emotes) = load_relay(&config_path).map_err(|e| {
        error!("Failed to start relay: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    let platforms = config.configured_platforms();
    for platform in &platforms {
        if let Some(section) = config.platform(*platform) {
            info!(
                "  {}: {} in {} (relays to {:?})",
                platform,
                section.username,
                section.default_channel(),
                section.relay_to
            );
        }
    }
    if let Some(coop) = &config.coop {
        info!("  Coop: {} <-> {} on {}", coop.primary, coop.secondary, coop.platform);
    }

    // ============================================================
    // Create channels for communication
    // ============================================================
    let channels = ChannelBundle::new(&platforms, config.queue_capacity());
    let shutdown_tx = channels.control.shutdown_tx;
    let router_tx = channels.router.router_tx;

    let adapters: AdapterMap = platforms
        .iter()
        .map(|p| (*p, Arc::new(LogAdapter::new(*p)) as Arc<dyn PlatformAdapter>))
        .collect();

    // ============================================================
    // Spawn forwarding and dispatch tasks
    // ============================================================
    let mut workers = Vec::new();

    for (platform, rx) in channels.router.inbound_rx {
        workers.push(spawn_forwarder(platform, rx, router_tx.clone()));
    }

    for (platform, rx) in channels.adapters.outbound_rx {
        match adapters.get(&platform) {
            Some(adapter) => workers.push(spawn_dispatcher(Arc::clone(adapter), rx)),
            None => warn!("No adapter for {}, deliveries will be dropped", platform),
        }
    }

    // ============================================================
    // Start the relay engine and the event source
    // ============================================================
    let lookup: Arc<dyn UserLookup> = Arc::new(HttpUserLookup::new(&config.lookup));
    let engine = RelayEngine::new(
        RelayRouter::new(config, emotes),
        lookup,
        router_tx,
        channels.router.outbound_tx,
    );
    let mut engine_task = tokio::spawn(engine.run(
        channels.router.router_rx,
        channels.control.shutdown_rx.clone(),
    ));

    let console = ConsoleSource::new(channels.adapters.inbound_tx);
    let console_task = tokio::spawn(console.run(channels.control.shutdown_rx));

    info!("Relay running");

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping relay...");
            true
        }
        _ = &mut engine_task => false,
        _ = console_task => {
            info!("Event source closed");
            true
        }
    };

    // Handle graceful shutdown
    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (engine already exited): {}", e);
        }
        let timeout = tokio::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, engine_task).await {
            Ok(Ok(())) => info!("Relay engine stopped"),
            Ok(Err(e)) => warn!("Relay engine task panicked: {}", e),
            Err(_) => warn!("Relay engine stop timed out"),
        }
    }

    // Dispatchers drain what the engine already queued, then end.
    let timeout = tokio::time::Duration::from_secs(5);
    if tokio::time::timeout(timeout, join_all(workers)).await.is_err() {
        warn!("Timed out flushing pending deliveries");
    }

    info!("Exiting...");
    Ok(())
}

/// Load and validate configuration, then read the emote tables it names.
fn load_relay(path: &str) -> common::error::Result<(Config, EmoteTranslator)> {
    let config = load_and_validate(path)?;
    let emotes = EmoteTranslator::from_config(config.emotes.as_ref())?;
    Ok((config, emotes))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
