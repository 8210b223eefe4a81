//! Threshold Engine - Price Updates In, Alerts Out
//!
//! Consumes `(address, price)` pairs from either feed, runs the
//! hysteresis transition under the registry write lock (so the
//! check-flag-then-set sequence is atomic per asset), appends alerts
//! to the bounded log, and dispatches notifications fire-and-forget.
//! A slow or failing delivery channel can never stall price
//! processing, and a delivery failure never rolls back the armed-flag
//! change (at-least-once alert intent).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::adapters::metrics::WatchMetrics;
use crate::domain::alert::{Alert, AlertDirection, AlertLog};
use crate::domain::asset::AssetClass;
use crate::ports::notifier::NotificationSink;

use super::registry::{AlertEvent, WatchRegistry};

/// The per-asset threshold state machine plus alert fan-out.
pub struct ThresholdEngine<N> {
    /// Shared watch list.
    registry: Arc<RwLock<WatchRegistry>>,
    /// Bounded recent-alerts buffer.
    alerts: Arc<Mutex<AlertLog>>,
    /// Delivery channel for alert notifications.
    notifier: Arc<N>,
    /// Prometheus counters.
    metrics: Arc<WatchMetrics>,
}

impl<N: NotificationSink> ThresholdEngine<N> {
    /// Create an engine over a shared registry and alert log.
    pub fn new(
        registry: Arc<RwLock<WatchRegistry>>,
        alerts: Arc<Mutex<AlertLog>>,
        notifier: Arc<N>,
        metrics: Arc<WatchMetrics>,
    ) -> Self {
        Self {
            registry,
            alerts,
            notifier,
            metrics,
        }
    }

    /// Apply one price update from a feed.
    ///
    /// `class` names the feed that produced the update; only assets
    /// with that classification are touched, so no asset is ever
    /// double-updated by both feeds. Returns the alerts emitted.
    pub async fn apply(&self, address: &str, class: AssetClass, price: f64) -> Vec<Alert> {
        let events = {
            let mut registry = self.registry.write().await;
            registry.apply_update(address, class, price)
        };

        let mut emitted = Vec::with_capacity(events.len());
        for event in events {
            emitted.push(self.emit(event).await);
        }
        emitted
    }

    /// Record one crossing and dispatch its notification.
    async fn emit(&self, event: AlertEvent) -> Alert {
        let alert = Alert {
            timestamp: Utc::now(),
            direction: event.crossing.direction,
            asset_label: event.label,
            price: event.crossing.price,
            threshold: event.crossing.threshold,
        };

        info!(
            asset = %alert.asset_label,
            direction = %alert.direction,
            price = alert.price,
            threshold = alert.threshold,
            "Threshold crossed"
        );
        let direction_label = match alert.direction {
            AlertDirection::High => "high",
            AlertDirection::Low => "low",
        };
        self.metrics
            .alerts_emitted
            .with_label_values(&[direction_label])
            .inc();

        {
            let mut log = self.alerts.lock().await;
            log.push(alert.clone());
        }

        let text = match alert.direction {
            AlertDirection::High => format!(
                "Price of {} crossed above {:.6} $! Current: {:.6} $",
                alert.asset_label, alert.threshold, alert.price
            ),
            AlertDirection::Low => format!(
                "Price of {} dropped below {:.6} $! Current: {:.6} $",
                alert.asset_label, alert.threshold, alert.price
            ),
        };

        // Fire-and-forget dispatch; delivery failure is observational
        // only and never rolls back the armed flags.
        let notifier = Arc::clone(&self.notifier);
        let metrics = Arc::clone(&self.metrics);
        let recipient = event.recipient;
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&recipient, &text).await {
                metrics.notify_failures.inc();
                warn!(recipient = %recipient, error = %e, "Notification delivery failed");
            }
        });

        alert
    }

    /// The retained alerts, oldest first (at most the configured cap).
    pub async fn recent_alerts(&self) -> Vec<Alert> {
        self.alerts.lock().await.recent()
    }

    /// Drop all retained alerts.
    pub async fn clear_alerts(&self) {
        self.alerts.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::asset::AssetConfig;
    use crate::ports::notifier::DeliveryError;

    /// Sink that counts deliveries and optionally fails them all.
    struct CountingSink {
        sent: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSink for CountingSink {
        async fn send(&self, _recipient: &str, _text: &str) -> Result<(), DeliveryError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DeliveryError::Transport(anyhow::anyhow!("down")))
            } else {
                Ok(())
            }
        }
    }

    fn engine(fail_delivery: bool) -> (ThresholdEngine<CountingSink>, Arc<RwLock<WatchRegistry>>) {
        let registry = Arc::new(RwLock::new(WatchRegistry::new()));
        let alerts = Arc::new(Mutex::new(AlertLog::new(10)));
        let notifier = Arc::new(CountingSink {
            sent: AtomicUsize::new(0),
            fail: fail_delivery,
        });
        let metrics = Arc::new(WatchMetrics::new().expect("metrics"));
        (
            ThresholdEngine::new(Arc::clone(&registry), alerts, notifier, metrics),
            registry,
        )
    }

    async fn add_asset(registry: &RwLock<WatchRegistry>, low: f64, high: f64) {
        registry
            .write()
            .await
            .add(
                AssetConfig {
                    address: "mint-a".to_string(),
                    name: Some("ALPHA".to_string()),
                    threshold_high: Some(high),
                    threshold_low: Some(low),
                    recipient: "chat-1".to_string(),
                },
                AssetClass::Polled,
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_breach_appends_alert_and_updates_price() {
        let (engine, registry) = engine(false);
        add_asset(&registry, 1.0, 2.0).await;

        let emitted = engine.apply("mint-a", AssetClass::Polled, 2.5).await;
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].direction, AlertDirection::High);

        let recent = engine.recent_alerts().await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].asset_label, "ALPHA");

        assert_eq!(registry.read().await.list()[0].price, Some(2.5));
    }

    #[tokio::test]
    async fn test_repeated_breach_alerts_once() {
        let (engine, registry) = engine(false);
        add_asset(&registry, 1.0, 2.0).await;

        engine.apply("mint-a", AssetClass::Polled, 2.5).await;
        engine.apply("mint-a", AssetClass::Polled, 3.0).await;
        engine.apply("mint-a", AssetClass::Polled, 2.6).await;

        assert_eq!(engine.recent_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_armed_flag() {
        let (engine, registry) = engine(true);
        add_asset(&registry, 1.0, 2.0).await;

        engine.apply("mint-a", AssetClass::Polled, 2.5).await;
        // Let the spawned dispatch task run and fail.
        tokio::task::yield_now().await;

        // The armed flag stays set despite the failed delivery; the
        // next breach stays silent.
        assert!(registry.read().await.list()[0].high_alert_sent);
        engine.apply("mint-a", AssetClass::Polled, 2.7).await;
        assert_eq!(engine.recent_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_alerts() {
        let (engine, registry) = engine(false);
        add_asset(&registry, 1.0, 2.0).await;

        engine.apply("mint-a", AssetClass::Polled, 0.5).await;
        assert_eq!(engine.recent_alerts().await.len(), 1);

        engine.clear_alerts().await;
        assert!(engine.recent_alerts().await.is_empty());
    }
}
