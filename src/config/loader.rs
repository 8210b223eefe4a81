//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;

    info!(
        name = %config.bot.name,
        poll_interval_ms = config.feeds.poll_interval_ms,
        alert_capacity = config.alerts.capacity,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
    anyhow::ensure!(
        config.feeds.stream_url.starts_with("ws"),
        "feeds.stream_url must be a ws:// or wss:// URL, got {}",
        config.feeds.stream_url
    );
    anyhow::ensure!(
        config.feeds.poll_interval_ms > 0,
        "feeds.poll_interval_ms must be positive"
    );
    anyhow::ensure!(
        config.feeds.fallback_sol_usd_rate > 0.0,
        "feeds.fallback_sol_usd_rate must be positive"
    );
    anyhow::ensure!(
        !config.providers.dexscreener_url.is_empty(),
        "providers.dexscreener_url must not be empty"
    );
    anyhow::ensure!(
        !config.providers.coingecko_url.is_empty(),
        "providers.coingecko_url must not be empty"
    );
    anyhow::ensure!(
        config.alerts.capacity > 0,
        "alerts.capacity must be positive"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        [bot]
        name = "tokenwatch"

        [feeds]
        stream_url = "wss://pumpportal.fun/api/data"

        [providers]
        dexscreener_url = "https://api.dexscreener.com/latest/dex/tokens"
        coingecko_url = "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd"
    "#;

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let config: AppConfig = toml::from_str(VALID).expect("parse");
        validate_config(&config).expect("validate");

        assert_eq!(config.feeds.poll_interval_ms, 250);
        assert_eq!(config.feeds.reconnect_backoff_secs, 5);
        assert_eq!(config.alerts.capacity, 10);
        assert_eq!(config.providers.reference_venue, "pumpfun");
        assert!((config.feeds.fallback_sol_usd_rate - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_ws_stream_url_rejected() {
        let bad = VALID.replace("wss://pumpportal.fun/api/data", "https://example.com");
        let config: AppConfig = toml::from_str(&bad).expect("parse");
        assert!(validate_config(&config).is_err());
    }
}
