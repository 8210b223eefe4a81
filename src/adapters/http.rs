//! Control Surface - HTTP Routes over the Tracker
//!
//! Thin axum router mapping the control operations onto the tracker.
//! All mutating routes answer with `{"success": true}` or a 400 with a
//! human-readable reason; user-input problems never become process
//! errors. Also serves `/metrics` (Prometheus) and `/live`.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::adapters::metrics::WatchMetrics;
use crate::domain::asset::AssetConfig;
use crate::domain::error::WatchError;
use crate::ports::notifier::NotificationSink;
use crate::ports::price_provider::{PriceProvider, ReferenceRate};
use crate::usecases::tracker::Tracker;

fn success() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "success": true })))
}

fn rejection(err: &WatchError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": err.to_string() })),
    )
}

/// Build the control router for a wired tracker.
pub fn router<P, R, N>(tracker: Arc<Tracker<P, R, N>>, metrics: Arc<WatchMetrics>) -> Router
where
    P: PriceProvider,
    R: ReferenceRate,
    N: NotificationSink,
{
    let start = {
        let tracker = Arc::clone(&tracker);
        move || {
            let tracker = Arc::clone(&tracker);
            async move {
                tracker.start().await;
                success()
            }
        }
    };

    let stop = {
        let tracker = Arc::clone(&tracker);
        move || {
            let tracker = Arc::clone(&tracker);
            async move {
                tracker.stop().await;
                success()
            }
        }
    };

    let list_assets = {
        let tracker = Arc::clone(&tracker);
        move || {
            let tracker = Arc::clone(&tracker);
            async move { Json(tracker.list_assets().await) }
        }
    };

    let add_asset = {
        let tracker = Arc::clone(&tracker);
        move |Json(config): Json<AssetConfig>| {
            let tracker = Arc::clone(&tracker);
            async move {
                match tracker.add_asset(config).await {
                    Ok(()) => success(),
                    Err(e) => rejection(&e),
                }
            }
        }
    };

    let edit_asset = {
        let tracker = Arc::clone(&tracker);
        move |Path(index): Path<usize>, Json(config): Json<AssetConfig>| {
            let tracker = Arc::clone(&tracker);
            async move {
                match tracker.edit_asset(index, config).await {
                    Ok(()) => success(),
                    Err(e) => rejection(&e),
                }
            }
        }
    };

    let remove_asset = {
        let tracker = Arc::clone(&tracker);
        move |Path(index): Path<usize>| {
            let tracker = Arc::clone(&tracker);
            async move {
                match tracker.remove_asset(index).await {
                    Ok(_) => success(),
                    Err(e) => rejection(&e),
                }
            }
        }
    };

    let list_alerts = {
        let tracker = Arc::clone(&tracker);
        move || {
            let tracker = Arc::clone(&tracker);
            async move { Json(tracker.recent_alerts().await) }
        }
    };

    let clear_alerts = {
        let tracker = Arc::clone(&tracker);
        move || {
            let tracker = Arc::clone(&tracker);
            async move {
                tracker.clear_alerts().await;
                success()
            }
        }
    };

    let render_metrics = {
        let metrics = Arc::clone(&metrics);
        move || {
            let metrics = Arc::clone(&metrics);
            async move { metrics.render() }
        }
    };

    Router::new()
        .route("/start", axum::routing::post(start))
        .route("/stop", axum::routing::post(stop))
        .route("/assets", get(list_assets).post(add_asset))
        .route(
            "/assets/:index",
            axum::routing::put(edit_asset).delete(remove_asset),
        )
        .route("/alerts", get(list_alerts).delete(clear_alerts))
        .route("/metrics", get(render_metrics))
        .route("/live", get(|| async { StatusCode::OK }))
}
