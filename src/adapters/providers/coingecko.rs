//! CoinGecko Reference Rate - SOL/USD Conversion
//!
//! Implements the `ReferenceRate` port over CoinGecko's simple-price
//! endpoint. Fetched once per stream connection attempt; the caller
//! substitutes the configured fallback constant on failure.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::ProviderConfig;
use crate::ports::price_provider::ReferenceRate;

/// CoinGecko-backed SOL/USD rate source.
pub struct CoinGeckoRate {
    /// Underlying HTTP client.
    http: Client,
    /// Full simple-price URL (ids and vs_currencies baked in).
    url: String,
}

impl CoinGeckoRate {
    /// Create a rate source from config.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build CoinGecko HTTP client")?;

        Ok(Self {
            http,
            url: config.coingecko_url.clone(),
        })
    }
}

#[async_trait]
impl ReferenceRate for CoinGeckoRate {
    async fn fetch(&self) -> Result<f64> {
        // Response shape: {"solana": {"usd": 150.0}}
        let body: HashMap<String, HashMap<String, f64>> = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("CoinGecko request failed")?
            .error_for_status()
            .context("CoinGecko returned an error status")?
            .json()
            .await
            .context("Invalid CoinGecko response JSON")?;

        body.get("solana")
            .and_then(|prices| prices.get("usd"))
            .copied()
            .context("CoinGecko response missing solana.usd")
    }
}
