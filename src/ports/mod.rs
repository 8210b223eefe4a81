//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `PriceProvider`: pair classification and spot-price lookup
//! - `ReferenceRate`: fiat conversion rate for streamed trade events
//! - `NotificationSink`: outbound alert delivery

pub mod notifier;
pub mod price_provider;

pub use notifier::{DeliveryError, NotificationSink};
pub use price_provider::{PriceProvider, ReferenceRate};
