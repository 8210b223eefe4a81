//! Watch list error taxonomy.
//!
//! Only the errors surfaced to direct callers of a mutation live here.
//! Upstream provider failures are absorbed locally with documented
//! fallbacks (default classification, skipped tick, fallback rate) and
//! never reach this type.

use thiserror::Error;

/// Failure of a watch list operation, surfaced to the caller.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Bad user input: missing address/recipient or inverted thresholds.
    #[error("{reason}")]
    Validation {
        /// Human-readable rejection reason.
        reason: String,
    },

    /// Positional index outside the current watch list.
    #[error("index {index} out of range (watch list has {len} entries)")]
    IndexOutOfRange {
        /// The index the caller supplied.
        index: usize,
        /// Watch list length at the time of the call.
        len: usize,
    },
}

impl WatchError {
    /// Shorthand for a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
