//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! watcher's core workflows.
//!
//! Use cases:
//! - `WatchRegistry`: the mutable, position-indexed watch list
//! - `ThresholdEngine`: price updates in, alerts and notifications out
//! - `Tracker`: lifecycle owner and control surface (start/stop/mutations)

pub mod engine;
pub mod registry;
pub mod tracker;

pub use engine::ThresholdEngine;
pub use registry::WatchRegistry;
pub use tracker::{Tracker, TrackerSettings};
