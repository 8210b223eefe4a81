//! Watch Registry - The Mutable Set of Tracked Assets
//!
//! Ordered collection of `TrackedAsset` keyed by position, exactly as
//! exposed on the control surface (edit/remove address entries by
//! index). Single source of truth read by both feeds; all mutation
//! happens behind the engine's write lock so no feed ever observes a
//! half-applied change.
//!
//! Positional indices are only valid until the next removal shifts
//! positions; callers re-fetch the list after any mutation.

use crate::domain::asset::{AssetClass, AssetConfig, TrackedAsset};
use crate::domain::error::WatchError;
use crate::domain::threshold::{self, Crossing};

/// A threshold crossing bound to the asset that produced it.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    /// Display label of the asset.
    pub label: String,
    /// Notification recipient of the asset.
    pub recipient: String,
    /// The breach itself.
    pub crossing: Crossing,
}

/// Ordered watch list with per-asset alert state.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    assets: Vec<TrackedAsset>,
}

impl WatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new asset with an already-derived classification.
    ///
    /// # Errors
    /// `WatchError::Validation` on bad input; the registry is unchanged.
    pub fn add(&mut self, config: AssetConfig, class: AssetClass) -> Result<(), WatchError> {
        config.validate()?;
        self.assets.push(TrackedAsset::new(config, class));
        Ok(())
    }

    /// Replace the asset at `index` wholesale.
    ///
    /// Both armed flags reset to false (a changed threshold re-arms
    /// immediately) and the classification is re-derived by the
    /// caller. Only the last computed price carries over.
    ///
    /// # Errors
    /// `WatchError::IndexOutOfRange` or `WatchError::Validation`; the
    /// prior entry is untouched on failure.
    pub fn edit(
        &mut self,
        index: usize,
        config: AssetConfig,
        class: AssetClass,
    ) -> Result<(), WatchError> {
        let len = self.assets.len();
        let slot = self
            .assets
            .get_mut(index)
            .ok_or(WatchError::IndexOutOfRange { index, len })?;
        config.validate()?;

        let previous_price = slot.price;
        let mut replacement = TrackedAsset::new(config, class);
        replacement.price = previous_price;
        *slot = replacement;
        Ok(())
    }

    /// Remove and return the asset at `index`.
    ///
    /// # Errors
    /// `WatchError::IndexOutOfRange`; the registry is unchanged.
    pub fn remove(&mut self, index: usize) -> Result<TrackedAsset, WatchError> {
        let len = self.assets.len();
        if index >= len {
            return Err(WatchError::IndexOutOfRange { index, len });
        }
        Ok(self.assets.remove(index))
    }

    /// Snapshot of the full watch list, in positional order.
    pub fn list(&self) -> Vec<TrackedAsset> {
        self.assets.clone()
    }

    /// Whether `index` currently names an entry.
    pub fn contains_index(&self, index: usize) -> bool {
        index < self.assets.len()
    }

    /// Number of tracked assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the watch list is empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Addresses of all streamed assets, deduplicated, insertion order.
    ///
    /// This is the exact key list sent in the stream subscription.
    pub fn streamed_keys(&self) -> Vec<String> {
        self.keys_for(AssetClass::Streamed)
    }

    /// Addresses of all polled assets, deduplicated, insertion order.
    pub fn polled_keys(&self) -> Vec<String> {
        self.keys_for(AssetClass::Polled)
    }

    fn keys_for(&self, class: AssetClass) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for asset in self.assets.iter().filter(|a| a.class == class) {
            if !keys.contains(&asset.address) {
                keys.push(asset.address.clone());
            }
        }
        keys
    }

    /// Apply one price update to every asset matching `address` whose
    /// classification matches `class`, returning the crossings to
    /// alert on.
    ///
    /// The class filter is what keeps the streamed/polled partition
    /// honest: a late update from the wrong feed (or for a
    /// just-removed asset) matches nothing and is silently dropped.
    pub fn apply_update(&mut self, address: &str, class: AssetClass, price: f64) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        for asset in self
            .assets
            .iter_mut()
            .filter(|a| a.address == address && a.class == class)
        {
            if let Some(crossing) = threshold::apply_price(asset, price) {
                events.push(AlertEvent {
                    label: asset.label(),
                    recipient: asset.recipient.clone(),
                    crossing,
                });
            }
        }
        events
    }
}
