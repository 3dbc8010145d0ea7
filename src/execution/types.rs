//! Execution types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Profit from rising prices
    Long,
    /// Profit from falling prices
    Short,
}

/// A risk-bounded order produced by the sizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Trade direction
    pub direction: Direction,
    /// Order notional (margin times leverage)
    pub notional: Decimal,
    /// Leverage, between 1 and the configured maximum
    pub leverage: f64,
    /// Protective stop on the losing side of the current price
    pub stop_loss: Decimal,
    /// Profit target on the winning side of the current price
    pub take_profit: Decimal,
    /// Hold window in minutes before a time-based exit
    pub hold_minutes: i64,
}

/// A single simulated fill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Venue the fill executed on
    pub venue_id: String,
    /// Fill price
    pub price: Decimal,
    /// Filled size
    pub size: Decimal,
    /// Simulated round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// The outcome of executing one order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// All fills, primary first
    pub fills: Vec<Fill>,
    /// Volume-weighted average fill price
    pub average_price: Decimal,
    /// (average_price - consolidated close) / close
    pub slippage: f64,
}

impl ExecutionReport {
    /// Total filled size across all fills
    pub fn total_size(&self) -> Decimal {
        self.fills.iter().map(|f| f.size).sum()
    }
}
