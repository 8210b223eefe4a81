//! Alert records and the bounded recent-alerts log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the band was breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    /// Price rose to or above the high threshold.
    High,
    /// Price fell to or below the low threshold.
    Low,
}

impl std::fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// One emitted alert. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// When the crossing was observed.
    pub timestamp: DateTime<Utc>,
    /// High or low breach.
    pub direction: AlertDirection,
    /// Display label of the asset (name or truncated address).
    pub asset_label: String,
    /// Price at the crossing (USD).
    pub price: f64,
    /// The breached threshold (USD).
    pub threshold: f64,
}

impl Alert {
    /// Render the alert as a single log-style line, 6-decimal prices.
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} - {}: {:.6} $ (threshold: {:.6} $)",
            self.timestamp.to_rfc3339(),
            match self.direction {
                AlertDirection::High => "High",
                AlertDirection::Low => "Low",
            },
            self.asset_label,
            self.price,
            self.threshold,
        )
    }
}

/// Bounded FIFO log of the most recent alerts.
///
/// Retains only the `capacity` newest entries; older ones are evicted
/// on push. Read-out is chronological, oldest first.
#[derive(Debug)]
pub struct AlertLog {
    entries: std::collections::VecDeque<Alert>,
    capacity: usize,
}

impl AlertLog {
    /// Create an empty log keeping at most `capacity` alerts.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: std::collections::VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an alert, evicting the oldest entry when full.
    pub fn push(&mut self, alert: Alert) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(alert);
    }

    /// The retained alerts, oldest first.
    pub fn recent(&self) -> Vec<Alert> {
        self.entries.iter().cloned().collect()
    }

    /// Drop all retained alerts.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of retained alerts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(price: f64) -> Alert {
        Alert {
            timestamp: Utc::now(),
            direction: AlertDirection::High,
            asset_label: "TEST".to_string(),
            price,
            threshold: 1.0,
        }
    }

    #[test]
    fn test_log_keeps_only_newest_entries() {
        let mut log = AlertLog::new(10);
        for i in 0..15 {
            log.push(alert(f64::from(i)));
        }

        let recent = log.recent();
        assert_eq!(recent.len(), 10);
        // Oldest first within the retained window: 5..=14.
        assert_eq!(recent.first().map(|a| a.price), Some(5.0));
        assert_eq!(recent.last().map(|a| a.price), Some(14.0));
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = AlertLog::new(10);
        log.push(alert(1.0));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_summary_uses_six_decimals() {
        let a = alert(1.5);
        assert!(a.summary().contains("1.500000 $"));
        assert!(a.summary().contains("threshold: 1.000000 $"));
    }
}
