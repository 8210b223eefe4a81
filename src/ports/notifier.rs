//! Notification Port - Outbound Alert Delivery Interface
//!
//! The engine treats delivery as a capability: send a text to a
//! recipient, or fail with a `DeliveryError`. Failures are logged and
//! never retried, and never roll back the armed-flag transition that
//! produced the alert (at-least-once alert intent).

use async_trait::async_trait;
use thiserror::Error;

/// Failure to deliver a notification.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient identifier is missing or rejected upstream.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Transport-level failure talking to the delivery channel.
    #[error("delivery transport failed: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Trait for alert delivery channels (e.g., Telegram).
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver `text` to `recipient`.
    ///
    /// # Errors
    /// `DeliveryError` on failure; callers log and move on.
    async fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError>;
}
