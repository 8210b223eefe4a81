//! Tracker - Watch List Lifecycle and Control Surface
//!
//! Single owned engine instance with an explicit lifecycle. Owns the
//! registry, the run flag, and the feed task handles; every control
//! operation (start/stop/add/edit/remove) is serialized through the
//! lifecycle mutex or the registry write lock, so no feed ever
//! observes a half-applied mutation.
//!
//! Policy notes preserved from the service's observable behavior:
//! - add/edit re-send the stream subscription in place (via the
//!   streamed-key watch channel)
//! - remove always bounces both feeds (full stop, then full start)
//!   when assets remain, even from a stopped state; remove-to-empty
//!   leaves tracking stopped

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::adapters::feeds::{PollFeed, StreamFeed};
use crate::adapters::metrics::WatchMetrics;
use crate::config::AppConfig;
use crate::domain::alert::{Alert, AlertLog};
use crate::domain::asset::{AssetClass, AssetConfig, TrackedAsset};
use crate::domain::error::WatchError;
use crate::ports::notifier::NotificationSink;
use crate::ports::price_provider::{PriceProvider, ReferenceRate};

use super::engine::ThresholdEngine;
use super::registry::WatchRegistry;

/// Timing and endpoint knobs the tracker hands to its feeds.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// WebSocket trade stream URL.
    pub stream_url: String,
    /// Poll interval for non-streamed assets.
    pub poll_interval: Duration,
    /// Reconnect backoff after a stream fault.
    pub reconnect_backoff: Duration,
    /// Fallback SOL/USD rate when the reference provider is down.
    pub fallback_rate: f64,
    /// Recent-alerts retention.
    pub alert_capacity: usize,
}

impl From<&AppConfig> for TrackerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            stream_url: config.feeds.stream_url.clone(),
            poll_interval: Duration::from_millis(config.feeds.poll_interval_ms),
            reconnect_backoff: Duration::from_secs(config.feeds.reconnect_backoff_secs),
            fallback_rate: config.feeds.fallback_sol_usd_rate,
            alert_capacity: config.alerts.capacity,
        }
    }
}

/// Feed task handles for one running session.
#[derive(Default)]
struct FeedTasks {
    /// Shutdown broadcaster for the current session, if running.
    shutdown_tx: Option<broadcast::Sender<()>>,
    /// Spawned feed tasks.
    handles: Vec<JoinHandle<()>>,
}

/// The watch list owner and control surface.
pub struct Tracker<P, R, N> {
    /// Shared watch list.
    registry: Arc<RwLock<WatchRegistry>>,
    /// Threshold engine shared with the feeds.
    engine: Arc<ThresholdEngine<N>>,
    /// Classification and quote provider.
    provider: Arc<P>,
    /// Fiat reference rate provider.
    rate: Arc<R>,
    /// Prometheus counters.
    metrics: Arc<WatchMetrics>,
    /// Timing and endpoints.
    settings: TrackerSettings,
    /// Whether feeds are active.
    running: Arc<AtomicBool>,
    /// Current streamed key set; feeds resubscribe on change.
    keys_tx: watch::Sender<Vec<String>>,
    /// Serializes start/stop/remove against each other.
    lifecycle: Mutex<FeedTasks>,
}

impl<P, R, N> Tracker<P, R, N>
where
    P: PriceProvider,
    R: ReferenceRate,
    N: NotificationSink,
{
    /// Build a stopped tracker with an empty watch list.
    pub fn new(
        settings: TrackerSettings,
        provider: Arc<P>,
        rate: Arc<R>,
        notifier: Arc<N>,
        metrics: Arc<WatchMetrics>,
    ) -> Self {
        let registry = Arc::new(RwLock::new(WatchRegistry::new()));
        let alerts = Arc::new(Mutex::new(AlertLog::new(settings.alert_capacity)));
        let engine = Arc::new(ThresholdEngine::new(
            Arc::clone(&registry),
            alerts,
            notifier,
            Arc::clone(&metrics),
        ));
        let (keys_tx, _) = watch::channel(Vec::new());

        Self {
            registry,
            engine,
            provider,
            rate,
            metrics,
            settings,
            running: Arc::new(AtomicBool::new(false)),
            keys_tx,
            lifecycle: Mutex::new(FeedTasks::default()),
        }
    }

    /// Whether the feeds are currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start both feeds. Idempotent: a second start is a no-op.
    pub async fn start(&self) {
        let mut tasks = self.lifecycle.lock().await;
        if self.running.load(Ordering::SeqCst) {
            info!("Tracking already running");
            return;
        }
        self.start_locked(&mut tasks).await;
    }

    /// Stop both feeds and close the stream connection.
    ///
    /// Ticks of the (still firing) poll timer become no-ops and the
    /// stream never reconnects until the next explicit start.
    pub async fn stop(&self) {
        let mut tasks = self.lifecycle.lock().await;
        self.stop_locked(&mut tasks);
    }

    /// Add a tracked asset.
    ///
    /// Classification is looked up from the provider before the
    /// registry is touched; a provider failure falls back to polled
    /// and the add still commits.
    ///
    /// # Errors
    /// `WatchError::Validation` on bad input, with no state change.
    pub async fn add_asset(&self, config: AssetConfig) -> Result<(), WatchError> {
        // Fail fast before the provider round trip.
        config.validate()?;
        let class = self.classify(&config.address).await;

        let mut registry = self.registry.write().await;
        registry.add(config, class)?;
        info!(assets = registry.len(), class = %class, "Asset added");
        self.publish_keys(&registry);
        Ok(())
    }

    /// Replace the asset at `index` wholesale.
    ///
    /// Resets both armed flags and re-derives the classification; a
    /// changed threshold re-arms immediately.
    ///
    /// # Errors
    /// `WatchError` on bad input or index, with no state change.
    pub async fn edit_asset(&self, index: usize, config: AssetConfig) -> Result<(), WatchError> {
        config.validate()?;
        let class = self.classify(&config.address).await;

        let mut registry = self.registry.write().await;
        registry.edit(index, config, class)?;
        info!(index, class = %class, "Asset replaced");
        self.publish_keys(&registry);
        Ok(())
    }

    /// Remove the asset at `index`, bouncing the feed pipeline.
    ///
    /// Tracking fully stops before the removal and fully starts
    /// afterwards whenever assets remain, regardless of the prior run
    /// state: removing from a stopped tracker with assets left turns
    /// tracking on. Remove-to-empty leaves tracking stopped.
    ///
    /// # Errors
    /// `WatchError::IndexOutOfRange` with no state change (no bounce).
    pub async fn remove_asset(&self, index: usize) -> Result<TrackedAsset, WatchError> {
        let mut tasks = self.lifecycle.lock().await;

        // Validate the index before touching the feeds.
        {
            let registry = self.registry.read().await;
            if !registry.contains_index(index) {
                return Err(WatchError::IndexOutOfRange {
                    index,
                    len: registry.len(),
                });
            }
        }

        if self.running.load(Ordering::SeqCst) {
            info!("Stopping tracking before removal");
            self.stop_locked(&mut tasks);
        }

        let (removed, remaining) = {
            let mut registry = self.registry.write().await;
            let removed = registry.remove(index)?;
            self.publish_keys(&registry);
            (removed, registry.len())
        };
        info!(index, address = %removed.address, remaining, "Asset removed");

        if remaining > 0 {
            info!(remaining, "Starting tracking after removal");
            self.start_locked(&mut tasks).await;
        }

        Ok(removed)
    }

    /// Snapshot of the watch list, in positional order.
    pub async fn list_assets(&self) -> Vec<TrackedAsset> {
        self.registry.read().await.list()
    }

    /// The retained alerts, oldest first.
    pub async fn recent_alerts(&self) -> Vec<Alert> {
        self.engine.recent_alerts().await
    }

    /// Drop all retained alerts.
    pub async fn clear_alerts(&self) {
        self.engine.clear_alerts().await;
    }

    /// Derive the classification, defaulting to polled on failure.
    async fn classify(&self, address: &str) -> AssetClass {
        match self.provider.classify(address).await {
            Ok(class) => class,
            Err(e) => {
                error!(address = %address, error = %e, "Classification lookup failed, defaulting to polled");
                AssetClass::Polled
            }
        }
    }

    /// Push the current streamed key set to the feeds.
    ///
    /// Called under the registry write lock so the published set is
    /// never stale relative to a committed mutation.
    fn publish_keys(&self, registry: &WatchRegistry) {
        let _ = self.keys_tx.send_replace(registry.streamed_keys());
    }

    /// Spawn both feed tasks. Caller holds the lifecycle lock.
    async fn start_locked(&self, tasks: &mut FeedTasks) {
        self.running.store(true, Ordering::SeqCst);
        let (shutdown_tx, _) = broadcast::channel(4);

        let stream = StreamFeed::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.rate),
            self.settings.stream_url.clone(),
            self.keys_tx.subscribe(),
            Arc::clone(&self.running),
            self.settings.reconnect_backoff,
            self.settings.fallback_rate,
            Arc::clone(&self.metrics),
        );
        let stream_shutdown = shutdown_tx.subscribe();
        let stream_handle = tokio::spawn(async move {
            if let Err(e) = stream.run(stream_shutdown).await {
                error!(error = %e, "Stream feed task failed");
            }
        });

        let poll = PollFeed::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.provider),
            Arc::clone(&self.registry),
            Arc::clone(&self.running),
            self.settings.poll_interval,
            Arc::clone(&self.metrics),
        );
        let poll_shutdown = shutdown_tx.subscribe();
        let poll_handle = tokio::spawn(async move {
            if let Err(e) = poll.run(poll_shutdown).await {
                error!(error = %e, "Poll feed task failed");
            }
        });

        tasks.shutdown_tx = Some(shutdown_tx);
        tasks.handles = vec![stream_handle, poll_handle];

        let assets = self.registry.read().await.len();
        info!(assets, "Tracking started");
    }

    /// Stop the feed tasks. Caller holds the lifecycle lock.
    ///
    /// The running flag clears first so a reconnect sleeping through
    /// the shutdown broadcast still refuses to retry.
    fn stop_locked(&self, tasks: &mut FeedTasks) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(shutdown_tx) = tasks.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        for handle in tasks.handles.drain(..) {
            // Prompt teardown even if a task sits in a connect call.
            handle.abort();
        }

        info!("Tracking stopped");
    }
}
