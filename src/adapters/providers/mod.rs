//! Upstream Provider Adapters - REST Market Data
//!
//! Concrete implementations of the price-data ports:
//! - `DexScreenerProvider`: pair classification + polled quotes
//! - `CoinGeckoRate`: SOL/USD reference rate for the stream feed

pub mod coingecko;
pub mod dexscreener;

pub use coingecko::CoinGeckoRate;
pub use dexscreener::DexScreenerProvider;
