//! Performance tracking module
//!
//! Cumulative trade statistics over a bounded rolling window

mod tracker;

pub use tracker::{PerformanceSnapshot, PerformanceTracker};
