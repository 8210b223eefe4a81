//! Integration Tests - Stream Feed Session Lifecycle
//!
//! Runs the stream feed against a minimal local WebSocket endpoint to
//! exercise session-ending paths that the in-module unit tests (pure
//! frame parsing) cannot reach.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use mockall::mock;
use tokio::sync::{broadcast, watch, Mutex, RwLock};

use tokenwatch::adapters::feeds::StreamFeed;
use tokenwatch::adapters::metrics::WatchMetrics;
use tokenwatch::domain::alert::AlertLog;
use tokenwatch::ports::notifier::DeliveryError;
use tokenwatch::usecases::engine::ThresholdEngine;
use tokenwatch::usecases::registry::WatchRegistry;

mock! {
    pub Rate {}

    #[async_trait::async_trait]
    impl tokenwatch::ports::price_provider::ReferenceRate for Rate {
        async fn fetch(&self) -> anyhow::Result<f64>;
    }
}

mock! {
    pub Sink {}

    #[async_trait::async_trait]
    impl tokenwatch::ports::notifier::NotificationSink for Sink {
        async fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError>;
    }
}

fn engine() -> Arc<ThresholdEngine<MockSink>> {
    Arc::new(ThresholdEngine::new(
        Arc::new(RwLock::new(WatchRegistry::new())),
        Arc::new(Mutex::new(AlertLog::new(10))),
        Arc::new(MockSink::new()),
        Arc::new(WatchMetrics::new().expect("metrics")),
    ))
}

#[tokio::test]
async fn test_key_channel_close_ends_stream_session() {
    // Minimal endpoint: accept one connection and drain inbound frames
    // until the peer closes.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(socket)
            .await
            .expect("handshake");
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut rate = MockRate::new();
    rate.expect_fetch().returning(|| Ok(150.0));

    let (keys_tx, keys_rx) = watch::channel(Vec::new());
    // Kept alive for the whole test: a dropped shutdown sender would
    // end the session through the shutdown arm instead.
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let feed = StreamFeed::new(
        engine(),
        Arc::new(rate),
        format!("ws://{addr}"),
        keys_rx,
        Arc::new(AtomicBool::new(true)),
        Duration::from_secs(1),
        150.0,
        Arc::new(WatchMetrics::new().expect("metrics")),
    );
    let handle = tokio::spawn(feed.run(shutdown_rx));

    // Dropping the key sender must end the session cleanly: no busy
    // re-polling of the closed channel, no reconnect attempt.
    drop(keys_tx);
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("feed task ended")
        .expect("feed task not cancelled");
    assert!(result.is_ok());

    server.abort();
}
