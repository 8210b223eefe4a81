//! Price Provider Port - Upstream Market Data Interface
//!
//! Defines the traits the engine needs from the upstream price data
//! services: classifying a token into a feed and fetching its current
//! spot price. Provider failures are recoverable: callers apply
//! documented fallbacks instead of propagating them to users.

use async_trait::async_trait;

use crate::domain::asset::AssetClass;

/// Trait for the upstream pair/quote data source.
///
/// Implementors wrap a REST market-data API (e.g., DexScreener). The
/// engine calls `classify` once per add/edit and `quote` once per
/// polled asset per tick.
#[async_trait]
pub trait PriceProvider: Send + Sync + 'static {
    /// Classify a token into its feed.
    ///
    /// A token listed on the reference venue is `Streamed`; anything
    /// else is `Polled`.
    ///
    /// # Errors
    /// Returns error on provider/network failure. Callers must fall
    /// back to `AssetClass::Polled` and commit the mutation anyway.
    async fn classify(&self, address: &str) -> anyhow::Result<AssetClass>;

    /// Fetch the current USD price for a token.
    ///
    /// `Ok(None)` means there is no active listing upstream, which is
    /// a valid no-update rather than an error.
    ///
    /// # Errors
    /// Returns error on provider/network failure. Callers log and
    /// skip the update for this tick.
    async fn quote(&self, address: &str) -> anyhow::Result<Option<f64>>;
}

/// Trait for the fiat reference rate used to convert streamed trade
/// volumes into USD prices.
///
/// Fetched once per stream connection attempt, never per message;
/// rate staleness within a connection is accepted.
#[async_trait]
pub trait ReferenceRate: Send + Sync + 'static {
    /// Fetch the current native-token/USD rate.
    ///
    /// # Errors
    /// Returns error on provider/network failure. Callers substitute
    /// the configured fallback constant.
    async fn fetch(&self) -> anyhow::Result<f64>;
}
