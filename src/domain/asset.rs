//! Tracked asset model - watch list entries and input validation.
//!
//! A `TrackedAsset` is one row of the watch list: the token address,
//! optional display name, the alert thresholds, and the per-direction
//! armed flags driving the hysteresis state machine. Classification
//! into a feed (streamed vs polled) is decided once at add/edit time
//! and never mutated elsewhere.

use serde::{Deserialize, Serialize};

use super::error::WatchError;

/// Which feed delivers prices for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Updated by the persistent WebSocket trade stream.
    Streamed,
    /// Updated by the periodic REST polling loop.
    Polled,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Streamed => write!(f, "streamed"),
            Self::Polled => write!(f, "polled"),
        }
    }
}

/// User-supplied configuration for adding or editing a tracked asset.
///
/// Classification is not part of the input; it is derived from the
/// provider at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Token contract address (the watch key).
    pub address: String,
    /// Optional human-readable name for alert messages.
    #[serde(default)]
    pub name: Option<String>,
    /// Alert when price rises to or above this value.
    #[serde(default)]
    pub threshold_high: Option<f64>,
    /// Alert when price falls to or below this value.
    #[serde(default)]
    pub threshold_low: Option<f64>,
    /// Notification recipient (Telegram chat id).
    pub recipient: String,
}

impl AssetConfig {
    /// Validate user input before any registry mutation.
    ///
    /// # Errors
    /// `WatchError::Validation` if the address or recipient is missing,
    /// or if both thresholds are set with `low >= high`. The registry
    /// is untouched on failure.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.address.trim().is_empty() {
            return Err(WatchError::validation("contract address is required"));
        }
        if self.recipient.trim().is_empty() {
            return Err(WatchError::validation("notification recipient is required"));
        }
        if let (Some(low), Some(high)) = (self.threshold_low, self.threshold_high) {
            if low >= high {
                return Err(WatchError::validation(
                    "low threshold must be strictly below high threshold",
                ));
            }
        }
        Ok(())
    }
}

/// One entry of the watch list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedAsset {
    /// Token contract address.
    pub address: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Feed classification, derived at add/edit time.
    pub class: AssetClass,
    /// High alert threshold (USD).
    pub threshold_high: Option<f64>,
    /// Low alert threshold (USD).
    pub threshold_low: Option<f64>,
    /// Last computed USD price.
    pub price: Option<f64>,
    /// High alert already emitted for the current excursion.
    pub high_alert_sent: bool,
    /// Low alert already emitted for the current excursion.
    pub low_alert_sent: bool,
    /// Notification recipient (Telegram chat id).
    pub recipient: String,
}

impl TrackedAsset {
    /// Build a fresh entry from validated input and a derived class.
    pub fn new(config: AssetConfig, class: AssetClass) -> Self {
        Self {
            address: config.address,
            name: config.name,
            class,
            threshold_high: config.threshold_high,
            threshold_low: config.threshold_low,
            price: None,
            high_alert_sent: false,
            low_alert_sent: false,
            recipient: config.recipient,
        }
    }

    /// Label used in alert messages: the name if set, else a
    /// truncated address.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => {
                let short: String = self.address.chars().take(10).collect();
                format!("{short}...")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(low: Option<f64>, high: Option<f64>) -> AssetConfig {
        AssetConfig {
            address: "So11111111111111111111111111111111111111112".to_string(),
            name: Some("WSOL".to_string()),
            threshold_high: high,
            threshold_low: low,
            recipient: "12345".to_string(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(config(Some(1.0), Some(2.0)).validate().is_ok());
        assert!(config(None, Some(2.0)).validate().is_ok());
        assert!(config(Some(1.0), None).validate().is_ok());
        assert!(config(None, None).validate().is_ok());
    }

    #[test]
    fn test_missing_address_rejected() {
        let mut cfg = config(None, None);
        cfg.address = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(WatchError::Validation { .. })));
    }

    #[test]
    fn test_missing_recipient_rejected() {
        let mut cfg = config(None, None);
        cfg.recipient = String::new();
        assert!(matches!(cfg.validate(), Err(WatchError::Validation { .. })));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        assert!(config(Some(2.0), Some(1.0)).validate().is_err());
        assert!(config(Some(2.0), Some(2.0)).validate().is_err());
    }

    #[test]
    fn test_label_falls_back_to_short_address() {
        let mut cfg = config(None, None);
        cfg.name = None;
        let asset = TrackedAsset::new(cfg, AssetClass::Polled);
        assert_eq!(asset.label(), "So11111111...");
    }

    #[test]
    fn test_new_asset_starts_disarmed() {
        let asset = TrackedAsset::new(config(Some(1.0), Some(2.0)), AssetClass::Streamed);
        assert!(!asset.high_alert_sent);
        assert!(!asset.low_alert_sent);
        assert!(asset.price.is_none());
        assert_eq!(asset.class, AssetClass::Streamed);
    }
}
