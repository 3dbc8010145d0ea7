//! Venue-selecting execution simulator
//!
//! Fills are deterministic given the snapshot and the per-instance RNG, so a
//! seeded simulator replays identically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::ExecutionConfig;
use crate::market::{MarketSnapshot, SnapshotError, VenueQuote};

use super::types::{Direction, ExecutionReport, Fill, Order};

/// Simulates order execution against the snapshot's venue quotes
pub struct ExecutionSimulator {
    config: ExecutionConfig,
    rng: StdRng,
}

impl ExecutionSimulator {
    /// Create a simulator with an entropy-seeded RNG
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a simulator that replays identically for a given seed
    pub fn with_seed(config: ExecutionConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Execute an order against the best venue for its side.
    ///
    /// Slippage noise is drawn inside the venue's half-spread, clamped to the
    /// configured bps bound, and always applied adversely. An empty venue
    /// list is a caller contract violation and fails fast.
    pub fn execute(
        &mut self,
        order: &Order,
        snapshot: &MarketSnapshot,
    ) -> Result<ExecutionReport, SnapshotError> {
        let venue = select_venue(&snapshot.venues, order.direction).ok_or(SnapshotError::NoVenues)?;

        let max_slip = f64::from(self.config.max_slippage_bps) / 10_000.0;
        let half_spread = venue.spread / 2.0;
        let noise: f64 = self.rng.gen_range(-half_spread..=half_spread);
        let adverse = noise.abs().min(max_slip);
        let slip = snapshot.close * to_decimal(adverse);

        let primary_price = match order.direction {
            Direction::Long => venue.ask() + slip,
            Direction::Short => venue.bid() - slip,
        };
        let total_size = order.notional / primary_price;
        let latency_ms = venue.latency_ms + self.latency_draw();

        let mut fills = Vec::with_capacity(2);
        if self.rng.gen::<f64>() < self.config.partial_fill_prob {
            // Split roughly 75/25; the residual lands later and slightly worse
            let residual_size = total_size * dec!(0.25);
            let penalty =
                snapshot.close * to_decimal(f64::from(self.config.residual_penalty_bps) / 10_000.0);
            let residual_price = match order.direction {
                Direction::Long => primary_price + penalty,
                Direction::Short => primary_price - penalty,
            };
            fills.push(Fill {
                venue_id: venue.venue_id.clone(),
                price: primary_price,
                size: total_size - residual_size,
                latency_ms,
            });
            fills.push(Fill {
                venue_id: venue.venue_id.clone(),
                price: residual_price,
                size: residual_size,
                latency_ms: latency_ms + self.latency_draw(),
            });
        } else {
            fills.push(Fill {
                venue_id: venue.venue_id.clone(),
                price: primary_price,
                size: total_size,
                latency_ms,
            });
        }

        let filled: Decimal = fills.iter().map(|f| f.size).sum();
        let weighted: Decimal = fills.iter().map(|f| f.price * f.size).sum();
        let average_price = if filled > Decimal::ZERO {
            weighted / filled
        } else {
            primary_price
        };
        let slippage =
            f64::try_from((average_price - snapshot.close) / snapshot.close).unwrap_or(0.0);

        tracing::info!(
            venue = %venue.venue_id,
            %average_price,
            slippage,
            fills = fills.len(),
            "order executed"
        );

        Ok(ExecutionReport {
            fills,
            average_price,
            slippage,
        })
    }

    fn latency_draw(&mut self) -> u64 {
        self.rng
            .gen_range(self.config.latency_ms_min..=self.config.latency_ms_max)
    }
}

/// Cheapest effective ask for longs, highest effective bid for shorts
fn select_venue(venues: &[VenueQuote], direction: Direction) -> Option<&VenueQuote> {
    match direction {
        Direction::Long => venues.iter().min_by(|a, b| a.ask().cmp(&b.ask())),
        Direction::Short => venues.iter().max_by(|a, b| a.bid().cmp(&b.bid())),
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default()
}
