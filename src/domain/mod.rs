//! Domain layer - Core watch list logic and models.
//!
//! Pure business logic for the price watcher: asset configuration and
//! validation, the hysteresis threshold state machine, and the bounded
//! alert log. No I/O here (hexagonal architecture inner ring); all
//! types are testable in isolation.

pub mod alert;
pub mod asset;
pub mod error;
pub mod threshold;

// Re-export core types for convenience
pub use alert::{Alert, AlertDirection, AlertLog};
pub use asset::{AssetClass, AssetConfig, TrackedAsset};
pub use error::WatchError;
pub use threshold::Crossing;
