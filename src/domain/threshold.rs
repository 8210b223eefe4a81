//! Hysteresis state machine - per-asset threshold transitions.
//!
//! Pure logic, no I/O. Each price update runs the same three-step
//! transition against an asset's armed flags:
//!
//! 1. `price >= high` and not yet armed high → high crossing, arm;
//! 2. else `price <= low` and not yet armed low → low crossing, arm;
//! 3. unconditionally afterwards: price strictly inside `(low, high)`
//!    with either flag armed → clear both flags (re-arm, no alert).
//!
//! Step 1 and 2 are mutually exclusive within one update; a price that
//! would satisfy both (only possible with misconfigured thresholds)
//! always resolves to the high branch. The re-arm check runs on every
//! update so one in-band tick is enough to enable the next alert.

use super::alert::AlertDirection;
use super::asset::TrackedAsset;

/// A threshold breach produced by a single price update.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    /// Which threshold was breached.
    pub direction: AlertDirection,
    /// The breached threshold value.
    pub threshold: f64,
    /// The price that breached it.
    pub price: f64,
}

/// Apply one price update to an asset's threshold state.
///
/// Stores the price on the asset, mutates the armed flags per the
/// transition rules, and returns the crossing to alert on, if any.
pub fn apply_price(asset: &mut TrackedAsset, price: f64) -> Option<Crossing> {
    asset.price = Some(price);

    let mut crossing = None;

    if let Some(high) = asset.threshold_high {
        if price >= high && !asset.high_alert_sent {
            asset.high_alert_sent = true;
            crossing = Some(Crossing {
                direction: AlertDirection::High,
                threshold: high,
                price,
            });
        }
    }

    if crossing.is_none() {
        if let Some(low) = asset.threshold_low {
            if price <= low && !asset.low_alert_sent {
                asset.low_alert_sent = true;
                crossing = Some(Crossing {
                    direction: AlertDirection::Low,
                    threshold: low,
                    price,
                });
            }
        }
    }

    // Re-arm when the price is strictly back inside the band.
    if let (Some(low), Some(high)) = (asset.threshold_low, asset.threshold_high) {
        if low < price && price < high && (asset.high_alert_sent || asset.low_alert_sent) {
            asset.high_alert_sent = false;
            asset.low_alert_sent = false;
        }
    }

    crossing
}
