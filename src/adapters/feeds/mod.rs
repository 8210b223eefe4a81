//! Price Feed Adapters - Dual-source Price Updates
//!
//! Two feeds drive the engine:
//! - `StreamFeed`: persistent WebSocket trade stream for streamed assets
//! - `PollFeed`: fixed-interval REST lookups for everything else

pub mod poll;
pub mod stream;

pub use poll::PollFeed;
pub use stream::StreamFeed;
