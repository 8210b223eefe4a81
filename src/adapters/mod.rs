//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, WebSockets). Each sub-module
//! groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `feeds`: stream and poll price feeds driving the engine
//! - `providers`: DexScreener classification/quotes, CoinGecko rate
//! - `notify`: Telegram alert delivery
//! - `http`: axum control surface
//! - `metrics`: Prometheus export

pub mod feeds;
pub mod http;
pub mod metrics;
pub mod notify;
pub mod providers;
