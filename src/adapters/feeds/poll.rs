//! Poll Feed - Periodic REST Price Lookups
//!
//! On a fixed interval, fetches the current price for every polled
//! asset from the upstream provider and feeds it into the engine. The
//! interval keeps firing while tracking is stopped; each tick checks
//! the running flag first and returns early, so stopping is a state
//! check rather than timer cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::adapters::metrics::WatchMetrics;
use crate::domain::asset::AssetClass;
use crate::ports::notifier::NotificationSink;
use crate::ports::price_provider::PriceProvider;
use crate::usecases::engine::ThresholdEngine;
use crate::usecases::registry::WatchRegistry;

/// The periodic polling feed for non-streamed assets.
pub struct PollFeed<P, N> {
    /// Threshold engine consuming the price updates.
    engine: Arc<ThresholdEngine<N>>,
    /// Upstream quote provider.
    provider: Arc<P>,
    /// Shared watch list (read-only access for the tick snapshot).
    registry: Arc<RwLock<WatchRegistry>>,
    /// Process-wide running flag; ticks are no-ops while cleared.
    running: Arc<AtomicBool>,
    /// Tick interval.
    interval: Duration,
    /// Prometheus counters.
    metrics: Arc<WatchMetrics>,
}

impl<P: PriceProvider, N: NotificationSink> PollFeed<P, N> {
    /// Create a poll feed bound to the shared engine state.
    pub fn new(
        engine: Arc<ThresholdEngine<N>>,
        provider: Arc<P>,
        registry: Arc<RwLock<WatchRegistry>>,
        running: Arc<AtomicBool>,
        interval: Duration,
        metrics: Arc<WatchMetrics>,
    ) -> Self {
        Self {
            engine,
            provider,
            registry,
            running,
            interval,
            metrics,
        }
    }

    /// Run the tick loop until shutdown.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    debug!("Shutdown signal in poll feed");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if !self.running.load(Ordering::SeqCst) {
                        trace!("Polling inactive, skipping tick");
                        continue;
                    }
                    self.poll_once().await;
                }
            }
        }
    }

    /// One tick: look up every polled asset, apply what succeeds.
    ///
    /// A failed fetch is logged and skipped; it affects neither the
    /// other assets in the tick nor the interval itself.
    async fn poll_once(&self) {
        let targets = { self.registry.read().await.polled_keys() };

        for address in targets {
            match self.provider.quote(&address).await {
                Ok(Some(price_usd)) => {
                    self.metrics.price_updates.with_label_values(&["poll"]).inc();
                    self.engine
                        .apply(&address, AssetClass::Polled, price_usd)
                        .await;
                }
                Ok(None) => {
                    debug!(address = %address, "No active listing, no price update");
                }
                Err(e) => {
                    self.metrics.poll_errors.inc();
                    warn!(address = %address, error = %e, "Quote fetch failed, skipping");
                }
            }
        }
    }
}
