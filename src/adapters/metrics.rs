//! Prometheus Metrics Registry - Watcher Observability
//!
//! Registers and exposes Prometheus metrics for the watcher: price
//! update throughput per feed, emitted alerts per direction, stream
//! reconnects, and upstream failures. Served on the control router
//! at `/metrics`.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Centralized Prometheus metrics for the watcher.
///
/// All metrics follow the naming convention `tokenwatch_*`.
pub struct WatchMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Price updates applied, labeled by feed (`stream` | `poll`).
    pub price_updates: IntCounterVec,
    /// Alerts emitted, labeled by direction (`high` | `low`).
    pub alerts_emitted: IntCounterVec,
    /// Stream reconnect attempts after a fault.
    pub stream_reconnects: IntCounter,
    /// Failed quote lookups in the polling loop.
    pub poll_errors: IntCounter,
    /// Failed notification deliveries.
    pub notify_failures: IntCounter,
}

impl WatchMetrics {
    /// Create and register all watcher metrics.
    ///
    /// # Errors
    /// Returns error if a metric cannot be registered (duplicate name).
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let price_updates = IntCounterVec::new(
            Opts::new(
                "tokenwatch_price_updates_total",
                "Price updates applied to the watch list",
            ),
            &["feed"],
        )?;

        let alerts_emitted = IntCounterVec::new(
            Opts::new("tokenwatch_alerts_total", "Threshold alerts emitted"),
            &["direction"],
        )?;

        let stream_reconnects = IntCounter::new(
            "tokenwatch_stream_reconnects_total",
            "Stream reconnect attempts after a fault",
        )?;

        let poll_errors = IntCounter::new(
            "tokenwatch_poll_errors_total",
            "Failed quote lookups in the polling loop",
        )?;

        let notify_failures = IntCounter::new(
            "tokenwatch_notify_failures_total",
            "Failed notification deliveries",
        )?;

        registry.register(Box::new(price_updates.clone()))?;
        registry.register(Box::new(alerts_emitted.clone()))?;
        registry.register(Box::new(stream_reconnects.clone()))?;
        registry.register(Box::new(poll_errors.clone()))?;
        registry.register(Box::new(notify_failures.clone()))?;

        Ok(Self {
            registry,
            price_updates,
            alerts_emitted,
            stream_reconnects,
            poll_errors,
            notify_failures,
        })
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder
            .encode(&self.registry.gather(), &mut buffer)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_contains_counters() {
        let metrics = WatchMetrics::new().expect("metrics");
        metrics.price_updates.with_label_values(&["poll"]).inc();
        metrics.alerts_emitted.with_label_values(&["high"]).inc();
        metrics.stream_reconnects.inc();

        let text = metrics.render();
        assert!(text.contains("tokenwatch_price_updates_total"));
        assert!(text.contains("tokenwatch_alerts_total"));
        assert!(text.contains("tokenwatch_stream_reconnects_total"));
    }
}
