//! Rolling-window performance statistics

use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PerformanceConfig;
use crate::execution::{Direction, ExecutionReport, Order};
use crate::risk::ClosedPosition;

/// Days per year used to annualize the per-trade Sharpe ratio
const DAYS_PER_YEAR: f64 = 365.0;

/// Cumulative performance view at one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Realized PnL across all closed trades
    pub realized_pnl: Decimal,
    /// Mark-to-market PnL of whatever the snapshot scope holds open
    pub unrealized_pnl: Decimal,
    /// Trades entered since construction
    pub total_trades: u64,
    /// Closed trades with positive realized PnL
    pub wins: u64,
    /// Annualized Sharpe ratio over the rolling returns window
    pub sharpe: f64,
    /// Worst single-trade adverse return seen, in [0, 1].
    ///
    /// Trade-level by definition; the portfolio-level drawdown lives with the
    /// portfolio state and is tracked independently.
    pub max_drawdown: f64,
}

/// Tracks per-trade returns in a bounded rolling window
pub struct PerformanceTracker {
    window: usize,
    returns: VecDeque<f64>,
    realized_pnl: Decimal,
    total_trades: u64,
    wins: u64,
    worst_trade_return: f64,
}

impl PerformanceTracker {
    /// Create a tracker with the configured window
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            window: config.returns_window,
            returns: VecDeque::with_capacity(config.returns_window),
            realized_pnl: Decimal::ZERO,
            total_trades: 0,
            wins: 0,
            worst_trade_return: 0.0,
        }
    }

    /// Register a newly executed trade and mark it against `mark_price`
    pub fn update(
        &mut self,
        report: &ExecutionReport,
        order: &Order,
        mark_price: Decimal,
    ) -> PerformanceSnapshot {
        self.total_trades += 1;
        let size = report.total_size();
        let entry_unrealized = match order.direction {
            Direction::Long => (mark_price - report.average_price) * size,
            Direction::Short => (report.average_price - mark_price) * size,
        };
        tracing::debug!(
            total_trades = self.total_trades,
            %entry_unrealized,
            "trade registered"
        );
        self.snapshot(entry_unrealized)
    }

    /// Fold a realized trade into the window and cumulative stats
    pub fn record_close(&mut self, closed: &ClosedPosition) {
        let margin = closed.position.margin();
        let trade_return = if margin > Decimal::ZERO {
            f64::try_from(closed.realized_pnl / margin).unwrap_or(0.0)
        } else {
            0.0
        };
        self.push_return(trade_return);
        if closed.realized_pnl > Decimal::ZERO {
            self.wins += 1;
        }
        self.realized_pnl += closed.realized_pnl;
        if trade_return < 0.0 {
            let adverse = (-trade_return).min(1.0);
            if adverse > self.worst_trade_return {
                self.worst_trade_return = adverse;
            }
        }
    }

    /// Compose a snapshot around an externally supplied unrealized PnL
    pub fn snapshot(&self, unrealized_pnl: Decimal) -> PerformanceSnapshot {
        PerformanceSnapshot {
            realized_pnl: self.realized_pnl,
            unrealized_pnl,
            total_trades: self.total_trades,
            wins: self.wins,
            sharpe: self.sharpe(),
            max_drawdown: self.worst_trade_return,
        }
    }

    /// Annualized Sharpe over the rolling window, 0 while variance is 0
    pub fn sharpe(&self) -> f64 {
        if self.returns.len() < 2 {
            return 0.0;
        }
        let n = self.returns.len() as f64;
        let mean = self.returns.iter().sum::<f64>() / n;
        let variance = self.returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        if std_dev == 0.0 {
            return 0.0;
        }
        mean * DAYS_PER_YEAR.sqrt() / std_dev
    }

    fn push_return(&mut self, trade_return: f64) {
        if self.returns.len() == self.window {
            self.returns.pop_front();
        }
        self.returns.push_back(trade_return);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::execution::Fill;
    use crate::risk::{CloseReason, Position};

    fn tracker() -> PerformanceTracker {
        PerformanceTracker::new(PerformanceConfig::default())
    }

    fn report(price: Decimal, size: Decimal) -> ExecutionReport {
        ExecutionReport {
            fills: vec![Fill {
                venue_id: "alpha".to_string(),
                price,
                size,
                latency_ms: 15,
            }],
            average_price: price,
            slippage: 0.0,
        }
    }

    fn order(direction: Direction) -> Order {
        Order {
            direction,
            notional: dec!(10000),
            leverage: 2.0,
            stop_loss: dec!(49000),
            take_profit: dec!(52000),
            hold_minutes: 60,
        }
    }

    fn closed(pnl: Decimal) -> ClosedPosition {
        let now = Utc::now();
        let position = Position {
            id: Uuid::new_v4(),
            direction: Direction::Long,
            entry_price: dec!(50000),
            size: dec!(0.2),
            leverage: 2.0,
            opened_at: now - Duration::minutes(30),
            stop_loss: dec!(49000),
            take_profit: dec!(52000),
            hold_until: now + Duration::minutes(30),
            unrealized_pnl: dec!(0),
        };
        ClosedPosition {
            position,
            exit_price: dec!(50000),
            closed_at: now,
            realized_pnl: pnl,
            reason: CloseReason::TakeProfit,
        }
    }

    #[test]
    fn test_update_counts_trades_and_marks_entry() {
        let mut tracker = tracker();
        let snapshot = tracker.update(&report(dec!(50100), dec!(0.2)), &order(Direction::Long), dec!(50000));
        assert_eq!(snapshot.total_trades, 1);
        // Long filled at 50100, marked at 50000: 0.2 * -100
        assert_eq!(snapshot.unrealized_pnl, dec!(-20));
    }

    #[test]
    fn test_update_short_marks_inverted() {
        let mut tracker = tracker();
        let snapshot = tracker.update(&report(dec!(49900), dec!(0.2)), &order(Direction::Short), dec!(50000));
        assert_eq!(snapshot.unrealized_pnl, dec!(-20));
    }

    #[test]
    fn test_record_close_accumulates() {
        let mut tracker = tracker();
        tracker.record_close(&closed(dec!(500)));
        tracker.record_close(&closed(dec!(-200)));
        let snapshot = tracker.snapshot(dec!(0));
        assert_eq!(snapshot.wins, 1);
        assert_eq!(snapshot.realized_pnl, dec!(300));
    }

    #[test]
    fn test_sharpe_zero_without_variance() {
        let mut tracker = tracker();
        assert_eq!(tracker.sharpe(), 0.0);
        tracker.record_close(&closed(dec!(100)));
        assert_eq!(tracker.sharpe(), 0.0);
        // Identical returns: zero variance stays defined as zero
        tracker.record_close(&closed(dec!(100)));
        assert_eq!(tracker.sharpe(), 0.0);
    }

    #[test]
    fn test_sharpe_positive_for_winning_mix() {
        let mut tracker = tracker();
        for pnl in [dec!(500), dec!(300), dec!(-100), dec!(400)] {
            tracker.record_close(&closed(pnl));
        }
        assert!(tracker.sharpe() > 0.0);
    }

    #[test]
    fn test_window_stays_bounded() {
        let mut tracker = PerformanceTracker::new(PerformanceConfig { returns_window: 100 });
        for i in 0..150 {
            let pnl = if i % 2 == 0 { dec!(100) } else { dec!(-50) };
            tracker.record_close(&closed(pnl));
        }
        assert_eq!(tracker.returns.len(), 100);
        assert_eq!(tracker.snapshot(dec!(0)).wins, 75);
    }

    #[test]
    fn test_worst_trade_return_is_monotone_and_bounded() {
        let mut tracker = tracker();
        // Margin is 50000 * 0.2 / 2 = 5000; -1000 is a 20% adverse return
        tracker.record_close(&closed(dec!(-1000)));
        let worst = tracker.snapshot(dec!(0)).max_drawdown;
        assert!((worst - 0.2).abs() < 1e-9);

        // A milder loss does not shrink the mark
        tracker.record_close(&closed(dec!(-100)));
        assert_eq!(tracker.snapshot(dec!(0)).max_drawdown, worst);

        // A catastrophic loss clamps at 1
        tracker.record_close(&closed(dec!(-50000)));
        assert_eq!(tracker.snapshot(dec!(0)).max_drawdown, 1.0);
    }
}
