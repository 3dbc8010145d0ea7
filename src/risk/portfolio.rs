//! Portfolio state and position lifecycle types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::execution::Direction;

/// Why a position left the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Price crossed the protective stop
    StopLoss,
    /// Price reached the profit target
    TakeProfit,
    /// Hold window elapsed
    TimeExpiry,
    /// Forced liquidation by the portfolio circuit breaker
    CircuitBreaker,
}

/// An open position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Position identifier
    pub id: Uuid,
    /// Trade direction
    pub direction: Direction,
    /// Entry fill price
    pub entry_price: Decimal,
    /// Position size in units of the instrument
    pub size: Decimal,
    /// Leverage applied at entry
    pub leverage: f64,
    /// Entry timestamp
    pub opened_at: DateTime<Utc>,
    /// Protective stop price, on the losing side of entry
    pub stop_loss: Decimal,
    /// Profit target price, on the winning side of entry
    pub take_profit: Decimal,
    /// Time-based exit deadline
    pub hold_until: DateTime<Utc>,
    /// Mark-to-market PnL as of the latest tick
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Directional PnL against the given price
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        match self.direction {
            Direction::Long => (price - self.entry_price) * self.size,
            Direction::Short => (self.entry_price - price) * self.size,
        }
    }

    /// Capital actually committed at entry (notional / leverage)
    pub fn margin(&self) -> Decimal {
        let notional = self.entry_price * self.size;
        let leverage = Decimal::try_from(self.leverage.max(1.0)).unwrap_or(Decimal::ONE);
        notional / leverage
    }

    /// Exit rule evaluation for one mark-to-market pass.
    ///
    /// Stop and take-profit outrank time expiry: a position whose price sits
    /// between its levels only closes once its hold window has elapsed.
    pub fn close_reason(&self, price: Decimal, now: DateTime<Utc>) -> Option<CloseReason> {
        let (stop_hit, take_hit) = match self.direction {
            Direction::Long => (price <= self.stop_loss, price >= self.take_profit),
            Direction::Short => (price >= self.stop_loss, price <= self.take_profit),
        };
        if stop_hit {
            Some(CloseReason::StopLoss)
        } else if take_hit {
            Some(CloseReason::TakeProfit)
        } else if now >= self.hold_until {
            Some(CloseReason::TimeExpiry)
        } else {
            None
        }
    }
}

/// A position realized out of the book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedPosition {
    /// The position as it stood at close
    pub position: Position,
    /// Exit price
    pub exit_price: Decimal,
    /// Exit timestamp
    pub closed_at: DateTime<Utc>,
    /// Realized PnL
    pub realized_pnl: Decimal,
    /// Exit trigger
    pub reason: CloseReason,
}

/// Mutable portfolio state, owned exclusively by the risk sizer
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioState {
    /// Equity from realized trades and starting capital
    pub realized_equity: Decimal,
    /// Sum of open-position mark-to-market PnL
    pub unrealized_pnl: Decimal,
    /// realized_equity + unrealized_pnl as of the latest refresh
    pub equity: Decimal,
    /// Running maximum of equity
    pub peak_equity: Decimal,
    /// Open positions
    pub open_positions: Vec<Position>,
    /// Worst drawdown fraction seen so far, never decreasing
    pub max_drawdown_observed: f64,
}

impl PortfolioState {
    /// Fresh portfolio at the configured starting equity
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            realized_equity: initial_equity,
            unrealized_pnl: Decimal::ZERO,
            equity: initial_equity,
            peak_equity: initial_equity,
            open_positions: vec![],
            max_drawdown_observed: 0.0,
        }
    }

    /// Current drawdown fraction from peak, 0 when there is no peak
    pub fn drawdown(&self) -> f64 {
        if self.peak_equity <= Decimal::ZERO {
            return 0.0;
        }
        let fraction = (self.peak_equity - self.equity) / self.peak_equity;
        f64::try_from(fraction).unwrap_or(0.0).max(0.0)
    }

    /// Number of open positions
    pub fn open_count(&self) -> usize {
        self.open_positions.len()
    }

    /// Recompute equity, peak, and the monotone drawdown high-water mark
    pub(crate) fn refresh(&mut self) {
        self.equity = self.realized_equity + self.unrealized_pnl;
        if self.equity > self.peak_equity {
            self.peak_equity = self.equity;
        }
        let drawdown = self.drawdown();
        if drawdown > self.max_drawdown_observed {
            self.max_drawdown_observed = drawdown;
        }
    }
}
