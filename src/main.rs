//! Tokenwatch - Entry Point
//!
//! Initializes configuration, logging, the upstream adapters, and the
//! tracking engine, then serves the control surface until
//! SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load Telegram bot token from env (TELEGRAM_BOT_TOKEN)
//! 4. Create DexScreener provider + CoinGecko rate source
//! 5. Create the tracker (registry + engine, feeds start on demand)
//! 6. Serve the axum control surface (/start, /stop, /assets, /alerts,
//!    /metrics, /live)
//! 7. Wait for SIGINT → stop feeds → exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::http;
use adapters::metrics::WatchMetrics;
use adapters::notify::TelegramNotifier;
use adapters::providers::{CoinGeckoRate, DexScreenerProvider};
use usecases::tracker::{Tracker, TrackerSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config =
        config::loader::load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        stream_url = %config.feeds.stream_url,
        "Starting tokenwatch"
    );

    // ── 3. Wire adapters ────────────────────────────────────
    let provider = Arc::new(
        DexScreenerProvider::new(&config.providers)
            .context("Failed to create DexScreener provider")?,
    );
    let rate = Arc::new(
        CoinGeckoRate::new(&config.providers).context("Failed to create CoinGecko rate source")?,
    );
    let notifier = Arc::new(
        TelegramNotifier::from_env().context("Failed to load Telegram credentials from env")?,
    );
    let metrics = Arc::new(WatchMetrics::new().context("Failed to register metrics")?);

    // ── 4. Create the tracker ───────────────────────────────
    let tracker = Arc::new(Tracker::new(
        TrackerSettings::from(&config),
        provider,
        rate,
        notifier,
        Arc::clone(&metrics),
    ));

    // ── 5. Serve the control surface ────────────────────────
    let app = http::router(Arc::clone(&tracker), metrics);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "Control surface listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Control server failed");
        }
    });

    // ── 6. Wait for SIGINT, then shut down ──────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    tracker.stop().await;
    server.abort();

    info!("Shutdown complete");
    Ok(())
}
