//! Stream Feed - Persistent WebSocket Trade Stream
//!
//! Maintains one long-lived connection to the trade stream, subscribes
//! to every streamed asset, and turns inbound trade events into USD
//! price updates for the engine.
//!
//! Behavior:
//! - One full-replacement subscription request on connect and on every
//!   change of the streamed key set (no delta subscriptions)
//! - Trade volumes converted to USD with a reference rate fetched once
//!   per connection attempt (rate staleness within a session accepted)
//! - Malformed frames logged and dropped; never fatal to the connection
//! - Auto-reconnect with fixed backoff while the running flag is set;
//!   an explicit stop ends the loop permanently

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::adapters::metrics::WatchMetrics;
use crate::domain::asset::AssetClass;
use crate::ports::notifier::NotificationSink;
use crate::ports::price_provider::ReferenceRate;
use crate::usecases::engine::ThresholdEngine;

/// Inbound trade event; fields are optional because the stream mixes
/// trade frames with acks and other event kinds.
#[derive(Debug, Deserialize)]
struct TradeFrame {
    /// Token contract address.
    mint: Option<String>,
    /// Trade volume in the native quote unit (SOL).
    #[serde(rename = "solAmount")]
    sol_amount: Option<f64>,
    /// Trade volume in token units.
    #[serde(rename = "tokenAmount")]
    token_amount: Option<f64>,
}

/// Build the full-replacement subscription payload for `keys`.
///
/// An empty key list is valid and subscribes to nothing.
fn subscription_payload(keys: &[String]) -> String {
    serde_json::json!({
        "method": "subscribeTokenTrade",
        "keys": keys,
    })
    .to_string()
}

/// Decode one text frame into an `(address, usd_price)` event.
///
/// `Ok(None)` means the frame is not a usable trade (missing fields or
/// a non-positive volume on either side) and is silently skipped.
/// `Err` means the frame is not valid JSON at all.
fn price_event(text: &str, sol_usd_rate: f64) -> Result<Option<(String, f64)>> {
    let frame: TradeFrame = serde_json::from_str(text).context("invalid stream frame JSON")?;

    let (Some(mint), Some(sol_amount), Some(token_amount)) =
        (frame.mint, frame.sol_amount, frame.token_amount)
    else {
        return Ok(None);
    };

    if sol_amount <= 0.0 || token_amount <= 0.0 {
        return Ok(None);
    }

    let price_usd = sol_amount / token_amount * sol_usd_rate;
    Ok(Some((mint, price_usd)))
}

/// The persistent trade stream feed.
pub struct StreamFeed<R, N> {
    /// Threshold engine consuming the price updates.
    engine: Arc<ThresholdEngine<N>>,
    /// Fiat reference rate provider (fetched once per connection).
    rate: Arc<R>,
    /// Stream endpoint URL.
    url: String,
    /// Current streamed key set, updated by registry mutations.
    keys_rx: watch::Receiver<Vec<String>>,
    /// Process-wide running flag gating reconnects.
    running: Arc<AtomicBool>,
    /// Fixed reconnect backoff.
    backoff: Duration,
    /// Rate used when the reference provider is down.
    fallback_rate: f64,
    /// Prometheus counters.
    metrics: Arc<WatchMetrics>,
}

impl<R: ReferenceRate, N: NotificationSink> StreamFeed<R, N> {
    /// Create a stream feed bound to the shared engine state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<ThresholdEngine<N>>,
        rate: Arc<R>,
        url: String,
        keys_rx: watch::Receiver<Vec<String>>,
        running: Arc<AtomicBool>,
        backoff: Duration,
        fallback_rate: f64,
        metrics: Arc<WatchMetrics>,
    ) -> Self {
        Self {
            engine,
            rate,
            url,
            keys_rx,
            running,
            backoff,
            fallback_rate,
            metrics,
        }
    }

    /// Run the connection loop until shutdown.
    ///
    /// Reconnects after `backoff` on any stream fault while the
    /// running flag is set. Once the flag clears (explicit stop) the
    /// loop exits and never retries, even on a later socket error.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(url = %self.url, "Connecting to trade stream");

        loop {
            match self.connect_and_stream(&mut shutdown_rx).await {
                Ok(()) => {
                    info!("Trade stream shut down gracefully");
                    return Ok(());
                }
                Err(e) => {
                    if !self.running.load(Ordering::SeqCst) {
                        info!("Tracking stopped; trade stream will not reconnect");
                        return Ok(());
                    }
                    self.metrics.stream_reconnects.inc();
                    warn!(
                        error = %e,
                        backoff_secs = self.backoff.as_secs(),
                        "Trade stream disconnected, reconnecting"
                    );
                    tokio::select! {
                        _ = shutdown_rx.recv() => return Ok(()),
                        () = tokio::time::sleep(self.backoff) => {}
                    }
                    if !self.running.load(Ordering::SeqCst) {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Single session: connect, subscribe, stream until fault or shutdown.
    async fn connect_and_stream(
        &self,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<()> {
        // Session-local receiver so resubscription state is per connection.
        let mut keys_rx = self.keys_rx.clone();
        // One rate fetch per connection attempt, never per message.
        let sol_usd_rate = match self.rate.fetch().await {
            Ok(rate) => rate,
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = self.fallback_rate,
                    "Reference rate unavailable, using fallback"
                );
                self.fallback_rate
            }
        };

        let (ws_stream, _) = connect_async(&self.url)
            .await
            .context("trade stream connection failed")?;
        let (mut write, mut read) = ws_stream.split();

        info!(rate = sol_usd_rate, "Trade stream connected");

        let keys = keys_rx.borrow_and_update().clone();
        write
            .send(Message::Text(subscription_payload(&keys)))
            .await
            .context("subscription send failed")?;
        info!(keys = keys.len(), "Stream subscription sent");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal in trade stream");
                    let _ = write.close().await;
                    return Ok(());
                }
                changed = keys_rx.changed() => {
                    if changed.is_err() {
                        // Sender dropped: the registry owner is gone,
                        // so the session has nothing left to serve.
                        info!("Key channel closed, ending trade stream session");
                        let _ = write.close().await;
                        return Ok(());
                    }
                    let keys = keys_rx.borrow_and_update().clone();
                    write
                        .send(Message::Text(subscription_payload(&keys)))
                        .await
                        .context("resubscription send failed")?;
                    info!(keys = keys.len(), "Stream subscription replaced");
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&text, sol_usd_rate).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            // Pong is handled automatically by tungstenite
                            debug!(len = data.len(), "Stream ping received");
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            anyhow::bail!("trade stream closed by peer");
                        }
                        Some(Err(e)) => {
                            anyhow::bail!("trade stream error: {e}");
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Parse one frame and apply the resulting price update.
    async fn handle_frame(&self, text: &str, sol_usd_rate: f64) {
        match price_event(text, sol_usd_rate) {
            Ok(Some((address, price_usd))) => {
                self.metrics.price_updates.with_label_values(&["stream"]).inc();
                self.engine
                    .apply(&address, AssetClass::Streamed, price_usd)
                    .await;
            }
            Ok(None) => {
                debug!("Incomplete trade frame, skipping");
            }
            Err(e) => {
                debug!(error = %e, "Dropping malformed stream frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_payload_shape() {
        let payload = subscription_payload(&["mint-a".to_string(), "mint-b".to_string()]);
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["method"], "subscribeTokenTrade");
        assert_eq!(value["keys"][0], "mint-a");
        assert_eq!(value["keys"][1], "mint-b");
    }

    #[test]
    fn test_subscription_payload_empty_is_valid() {
        let payload = subscription_payload(&[]);
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert!(value["keys"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_price_event_converts_to_usd() {
        let text = r#"{"mint":"mint-a","solAmount":2.0,"tokenAmount":4.0}"#;
        let (address, price) = price_event(text, 150.0).unwrap().expect("event");
        assert_eq!(address, "mint-a");
        assert!((price - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_price_event_missing_volume_skipped() {
        let text = r#"{"mint":"mint-a","solAmount":2.0}"#;
        assert!(price_event(text, 150.0).unwrap().is_none());
    }

    #[test]
    fn test_price_event_nonpositive_volumes_skipped() {
        let zero_base = r#"{"mint":"mint-a","solAmount":2.0,"tokenAmount":0.0}"#;
        assert!(price_event(zero_base, 150.0).unwrap().is_none());

        let negative_base = r#"{"mint":"mint-a","solAmount":2.0,"tokenAmount":-1.0}"#;
        assert!(price_event(negative_base, 150.0).unwrap().is_none());

        // A zero quote volume would otherwise produce a 0.0 price and
        // fire a spurious low alert; it is not a trade.
        let zero_quote = r#"{"mint":"mint-a","solAmount":0.0,"tokenAmount":5.0}"#;
        assert!(price_event(zero_quote, 150.0).unwrap().is_none());
    }

    #[test]
    fn test_price_event_malformed_json_is_error() {
        assert!(price_event("not json at all", 150.0).is_err());
    }

    #[test]
    fn test_price_event_other_event_kinds_skipped() {
        // Subscription acks and similar frames parse but carry no trade.
        let ack = r#"{"message":"Successfully subscribed to token trades"}"#;
        assert!(price_event(ack, 150.0).unwrap().is_none());
    }
}
