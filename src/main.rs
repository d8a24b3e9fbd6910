//! Dragon/Tiger Session Bot — Entry Point
//!
//! Initializes configuration, logging, the profile store and the
//! Telegram transport. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load .env, then config.toml + validate
//! 2. Init tracing (JSON or plain, `RUST_LOG` overrides)
//! 3. Read BOT_TOKEN
//! 4. Create JsonProfileStore + SessionService
//! 5. Create TelegramClient (implements Notifier port)
//! 6. Create AutoSuggestScheduler + CommandHandler
//! 7. Spawn health server (/live, /ready, /metrics)
//! 8. Spawn TelegramPoller (long polling, tokio::select!)
//! 9. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use dragon_tiger_bot::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use dragon_tiger_bot::adapters::persistence::JsonProfileStore;
use dragon_tiger_bot::adapters::telegram::{TelegramClient, TelegramClientConfig, TelegramPoller};
use dragon_tiger_bot::config::{self, AppConfig};
use dragon_tiger_bot::domain::Advisor;
use dragon_tiger_bot::ports::{ProfileRepository, SystemClock};
use dragon_tiger_bot::usecases::{AutoSuggestScheduler, CommandHandler, SessionService};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load .env and configuration ──────────────────────
    let dotenv = dotenvy::dotenv();
    let config = config::loader::load_config(&config::loader::config_path())
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured logging ────────────────────
    init_tracing(&config);
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "Ignoring unreadable .env file");
        }
    }

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.persistence.data_dir,
        "Starting Dragon/Tiger session bot"
    );

    // ── 3. Bot token (never logged) ─────────────────────────
    let token = config::loader::bot_token()?;

    // ── 4. Storage, metrics and the session service ─────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
    let store: Arc<dyn ProfileRepository> = Arc::new(
        JsonProfileStore::new(&config.persistence.data_dir)
            .await
            .context("Failed to open profile store")?,
    );

    let advisor = Advisor::new(config.advisor.to_kelly()?);
    let defaults = config.defaults.to_profile_defaults()?;
    let service = Arc::new(
        SessionService::new(Arc::clone(&store), Arc::new(SystemClock), advisor, defaults)
            .with_metrics(Arc::clone(&metrics)),
    );

    // ── 5. Telegram client (Notifier port) ──────────────────
    let client = Arc::new(
        TelegramClient::new(TelegramClientConfig::new(&config.telegram, token))
            .context("Failed to create Telegram client")?
            .with_metrics(Arc::clone(&metrics)),
    );
    let me = client
        .get_me()
        .await
        .context("Telegram rejected the bot token")?;
    info!(bot_id = me.id, username = ?me.username, "Telegram identity confirmed");

    // ── 6. Scheduler and command handler ────────────────────
    let scheduler = Arc::new(
        AutoSuggestScheduler::new(
            Arc::clone(&service),
            client.clone(),
            Duration::from_secs(config.auto.interval_seconds),
        )
        .with_metrics(Arc::clone(&metrics)),
    );
    let handler = Arc::new(
        CommandHandler::new(Arc::clone(&service), Arc::clone(&scheduler))
            .with_metrics(Arc::clone(&metrics)),
    );

    // ── 7. Shutdown channel + health server ─────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new(Arc::clone(&store), Arc::clone(&metrics)));

    let health_handle = if config.health.enabled {
        let address = format!("{}:{}", config.health.bind_host, config.health.port);
        let server = HealthServer::new(Arc::clone(&health), address);
        let health_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(health_shutdown).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    // ── 8. Telegram polling loop ────────────────────────────
    let poller = TelegramPoller::new(Arc::clone(&client), handler);
    let poller_shutdown = shutdown_tx.subscribe();
    let poller_handle = tokio::spawn(async move {
        if let Err(e) = poller.run(poller_shutdown).await {
            error!(error = %e, "Telegram poller failed");
        }
    });

    info!("All tasks spawned — bot is running");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for SIGINT");
    }
    info!("SIGINT received, initiating graceful shutdown");

    // Readiness probe → 503
    health.accepting.store(false, Ordering::Relaxed);

    let _ = shutdown_tx.send(());
    scheduler.shutdown();

    let _ = tokio::time::timeout(Duration::from_secs(10), poller_handle).await;
    if let Some(handle) = health_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level));

    if config.bot.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
