//! Configuration Module - TOML-based Watcher Configuration
//!
//! Loads and validates configuration from `config.toml`. All upstream
//! endpoints and timing knobs are externalized here - nothing is
//! hardcoded in the domain layer. The Telegram bot token is the one
//! exception: it is a secret and comes from the environment.

pub mod loader;

use serde::Deserialize;

/// Top-level watcher configuration.
///
/// Loaded from `config.toml` at startup and validated before any
/// task is spawned.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bot identity and logging.
    pub bot: BotConfig,
    /// Feed timing and stream endpoint.
    pub feeds: FeedConfig,
    /// Upstream REST provider endpoints.
    pub providers: ProviderConfig,
    /// Alert log sizing.
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Control/metrics HTTP server.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Human-readable bot name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Feed timing and stream endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket trade stream URL.
    pub stream_url: String,
    /// Poll interval for non-streamed assets (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Reconnect backoff after a stream fault (seconds).
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_secs: u64,
    /// SOL/USD rate used when the reference rate provider is down.
    #[serde(default = "default_fallback_rate")]
    pub fallback_sol_usd_rate: f64,
}

/// Upstream REST provider endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// DexScreener token endpoint base URL.
    pub dexscreener_url: String,
    /// CoinGecko simple-price endpoint URL for SOL/USD.
    pub coingecko_url: String,
    /// DEX id of the streaming venue: tokens listed there are fed by
    /// the trade stream, everything else is polled.
    #[serde(default = "default_reference_venue")]
    pub reference_venue: String,
    /// Request timeout for provider calls (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Alert log sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Number of recent alerts retained for read-out.
    #[serde(default = "default_alert_capacity")]
    pub capacity: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            capacity: default_alert_capacity(),
        }
    }
}

/// Control/metrics HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the control surface and /metrics.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    250
}

fn default_reconnect_backoff() -> u64 {
    5
}

fn default_fallback_rate() -> f64 {
    150.0
}

fn default_reference_venue() -> String {
    "pumpfun".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_alert_capacity() -> usize {
    10
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}
