//! DexScreener Provider - Pair Classification and Spot Quotes
//!
//! Implements the `PriceProvider` port over the DexScreener token
//! REST API. One endpoint serves both concerns: the pair list decides
//! the feed classification, and the first priced pair supplies the
//! polled quote.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::domain::asset::AssetClass;
use crate::ports::price_provider::PriceProvider;

/// DexScreener token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenPairsResponse {
    /// Listed pairs for the token; absent when nothing is listed.
    pairs: Option<Vec<PairInfo>>,
}

/// One listed trading pair.
#[derive(Debug, Deserialize)]
struct PairInfo {
    /// Venue identifier (e.g., "pumpfun", "raydium").
    #[serde(rename = "dexId", default)]
    dex_id: String,
    /// USD price as a string, when quoted.
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
}

/// Whether any listed pair sits on the reference (streaming) venue.
fn is_reference_listed(response: &TokenPairsResponse, venue: &str) -> bool {
    response
        .pairs
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|pair| pair.dex_id == venue)
}

/// First parseable USD price across the listed pairs, if any.
fn extract_quote(response: &TokenPairsResponse) -> Option<f64> {
    response
        .pairs
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find_map(|pair| pair.price_usd.as_deref()?.parse::<f64>().ok())
}

/// DexScreener-backed price provider.
pub struct DexScreenerProvider {
    /// Underlying HTTP client.
    http: Client,
    /// Token endpoint base URL.
    base_url: String,
    /// Venue whose listings are classified as streamed.
    reference_venue: String,
}

impl DexScreenerProvider {
    /// Create a provider from config.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build DexScreener HTTP client")?;

        Ok(Self {
            http,
            base_url: config.dexscreener_url.clone(),
            reference_venue: config.reference_venue.clone(),
        })
    }

    async fn fetch_pairs(&self, address: &str) -> Result<TokenPairsResponse> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("DexScreener request failed")?
            .error_for_status()
            .context("DexScreener returned an error status")?;

        response
            .json::<TokenPairsResponse>()
            .await
            .context("Invalid DexScreener response JSON")
    }
}

#[async_trait]
impl PriceProvider for DexScreenerProvider {
    async fn classify(&self, address: &str) -> Result<AssetClass> {
        let pairs = self.fetch_pairs(address).await?;
        let class = if is_reference_listed(&pairs, &self.reference_venue) {
            AssetClass::Streamed
        } else {
            AssetClass::Polled
        };
        debug!(address = %address, class = %class, "Token classified");
        Ok(class)
    }

    async fn quote(&self, address: &str) -> Result<Option<f64>> {
        let pairs = self.fetch_pairs(address).await?;
        Ok(extract_quote(&pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTED: &str = r#"{
        "pairs": [
            {"dexId": "raydium", "priceUsd": "0.004217"},
            {"dexId": "pumpfun", "priceUsd": "0.004105"}
        ]
    }"#;

    #[test]
    fn test_reference_listing_detected() {
        let response: TokenPairsResponse = serde_json::from_str(LISTED).unwrap();
        assert!(is_reference_listed(&response, "pumpfun"));
        assert!(!is_reference_listed(&response, "orca"));
    }

    #[test]
    fn test_quote_takes_first_priced_pair() {
        let response: TokenPairsResponse = serde_json::from_str(LISTED).unwrap();
        let price = extract_quote(&response).expect("price");
        assert!((price - 0.004_217).abs() < 1e-12);
    }

    #[test]
    fn test_no_pairs_means_no_quote() {
        let response: TokenPairsResponse = serde_json::from_str(r#"{"pairs": null}"#).unwrap();
        assert!(!is_reference_listed(&response, "pumpfun"));
        assert!(extract_quote(&response).is_none());
    }

    #[test]
    fn test_unpriced_pairs_skipped() {
        let text = r#"{"pairs": [{"dexId": "raydium"}, {"dexId": "orca", "priceUsd": "1.5"}]}"#;
        let response: TokenPairsResponse = serde_json::from_str(text).unwrap();
        assert_eq!(extract_quote(&response), Some(1.5));
    }
}
