//! Market snapshot boundary types
//!
//! Normalized, read-only view of one tick of market data as delivered by the
//! ingestion adapter. Validation lives here so a bad snapshot fails the tick
//! before any component mutates state.

mod types;

pub use types::{MarketSnapshot, SnapshotError, VenueQuote};
