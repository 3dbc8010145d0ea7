//! Snapshot and venue quote types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Floor for normalized volatility so downstream ratios stay finite
const VOLATILITY_EPSILON: f64 = 1e-4;

/// Snapshot validation errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No venue quotes present
    #[error("snapshot carries no venue quotes")]
    NoVenues,
    /// Consolidated close is zero or negative
    #[error("non-positive close price: {0}")]
    NonPositiveClose(Decimal),
    /// Candle bounds are incoherent
    #[error("incoherent candle: high {high} below low {low}")]
    IncoherentCandle { high: Decimal, low: Decimal },
    /// Consolidated volume is negative
    #[error("negative volume: {0}")]
    NegativeVolume(Decimal),
    /// A venue quoted a non-positive price or negative spread
    #[error("venue {venue_id} quote invalid: price {price}, spread {spread}")]
    InvalidVenueQuote {
        venue_id: String,
        price: Decimal,
        spread: f64,
    },
}

/// One venue's quote inside a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueQuote {
    /// Venue identifier
    pub venue_id: String,
    /// Venue mid price
    pub price: Decimal,
    /// Quoted spread as a fraction of price
    pub spread: f64,
    /// Quoted volume
    pub volume: Decimal,
    /// Venue round-trip latency in milliseconds
    pub latency_ms: u64,
}

impl VenueQuote {
    /// Effective ask: mid price plus half the spread
    pub fn ask(&self) -> Decimal {
        self.price + self.half_spread()
    }

    /// Effective bid: mid price minus half the spread
    pub fn bid(&self) -> Decimal {
        self.price - self.half_spread()
    }

    fn half_spread(&self) -> Decimal {
        self.price * Decimal::try_from(self.spread / 2.0).unwrap_or_default()
    }
}

/// Consolidated market state at one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Snapshot timestamp, the tick's notion of "now"
    pub timestamp: DateTime<Utc>,
    /// Consolidated open price
    pub open: Decimal,
    /// Consolidated high price
    pub high: Decimal,
    /// Consolidated low price
    pub low: Decimal,
    /// Consolidated close price
    pub close: Decimal,
    /// Consolidated volume
    pub volume: Decimal,
    /// Per-venue quotes
    pub venues: Vec<VenueQuote>,
    /// Auxiliary macro-environment scalar from the ingestion adapter
    pub macro_bias: f64,
    /// Auxiliary sentiment scalar from the ingestion adapter
    pub sentiment_bias: f64,
}

impl MarketSnapshot {
    /// Enforce the boundary contract with the ingestion adapter.
    ///
    /// A failed validation fails the whole tick; nothing downstream may run
    /// against an invalid snapshot.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.venues.is_empty() {
            return Err(SnapshotError::NoVenues);
        }
        if self.close <= Decimal::ZERO {
            return Err(SnapshotError::NonPositiveClose(self.close));
        }
        if self.high < self.low {
            return Err(SnapshotError::IncoherentCandle {
                high: self.high,
                low: self.low,
            });
        }
        if self.volume < Decimal::ZERO {
            return Err(SnapshotError::NegativeVolume(self.volume));
        }
        for venue in &self.venues {
            if venue.price <= Decimal::ZERO || venue.spread < 0.0 {
                return Err(SnapshotError::InvalidVenueQuote {
                    venue_id: venue.venue_id.clone(),
                    price: venue.price,
                    spread: venue.spread,
                });
            }
        }
        Ok(())
    }

    /// Normalized intra-tick volatility: (high - low) / close, floored away
    /// from zero so leverage and stop math never divide by zero.
    pub fn normalized_volatility(&self) -> f64 {
        let range = (self.high - self.low) / self.close;
        f64::try_from(range).unwrap_or(0.0).max(VOLATILITY_EPSILON)
    }
}
