//! Risk-adjusted order sizing and the position book
//!
//! Owns the portfolio state. Turns a fused decision into a bounded order,
//! applies fills, and runs the per-tick mark-to-market pass including the
//! circuit-breaker fail-safe.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::RiskConfig;
use crate::execution::{Direction, Order};
use crate::fusion::{Action, Decision};
use crate::market::MarketSnapshot;

use super::kelly::{kelly_fraction, reward_risk_proxy, win_rate_proxy};
use super::portfolio::{CloseReason, ClosedPosition, PortfolioState, Position};

/// Sizes orders against the live portfolio and manages position lifecycle
pub struct RiskSizer {
    config: RiskConfig,
    portfolio: PortfolioState,
}

impl RiskSizer {
    /// Create a sizer with a fresh portfolio at the configured equity
    pub fn new(config: RiskConfig) -> Self {
        let portfolio = PortfolioState::new(config.initial_equity);
        Self { config, portfolio }
    }

    /// Read-only view of the portfolio
    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    /// Turn a decision into a bounded order.
    ///
    /// Returns `None` for holds and whenever the computed risk budget is not
    /// positive; a skipped trade is an expected outcome, not an error.
    pub fn evaluate(&self, decision: &Decision, snapshot: &MarketSnapshot) -> Option<Order> {
        let direction = match decision.action {
            Action::Buy => Direction::Long,
            Action::Sell => Direction::Short,
            Action::Hold => return None,
        };

        let vol = snapshot.normalized_volatility();
        let win_rate = win_rate_proxy(decision.confidence);
        let reward_risk = reward_risk_proxy(decision.confidence);
        let kelly = kelly_fraction(win_rate, reward_risk) * self.config.kelly_multiplier;
        let risk_fraction = (kelly * decision.size_hint)
            .min(self.config.max_portfolio_risk)
            .min(self.config.risk_per_trade_cap);

        let risk_budget = self.portfolio.equity * to_decimal(risk_fraction);
        if risk_budget <= Decimal::ZERO {
            tracing::debug!(risk_fraction, equity = %self.portfolio.equity, "no trade budget");
            return None;
        }

        let leverage = (1.0 / vol).clamp(1.0, self.config.max_leverage);
        let notional = risk_budget * to_decimal(leverage);

        let stop_distance = snapshot.close * to_decimal(vol * self.config.stop_multiplier);
        let take_distance = stop_distance * to_decimal(reward_risk);
        let (stop_loss, take_profit) = match direction {
            Direction::Long => (snapshot.close - stop_distance, snapshot.close + take_distance),
            Direction::Short => (snapshot.close + stop_distance, snapshot.close - take_distance),
        };

        let span = (self.config.max_hold_minutes - self.config.min_hold_minutes) as f64;
        let hold_minutes = (self.config.min_hold_minutes
            + (span * decision.confidence).round() as i64)
            .clamp(self.config.min_hold_minutes, self.config.max_hold_minutes);

        tracing::debug!(
            ?direction,
            %notional,
            leverage,
            %stop_loss,
            %take_profit,
            hold_minutes,
            "sized order"
        );

        Some(Order {
            direction,
            notional,
            leverage,
            stop_loss,
            take_profit,
            hold_minutes,
        })
    }

    /// Apply an entry fill, opening a position in the book
    pub fn register_fill(
        &mut self,
        order: &Order,
        fill_price: Decimal,
        now: DateTime<Utc>,
    ) -> Position {
        let size = order.notional / fill_price;
        let position = Position {
            id: Uuid::new_v4(),
            direction: order.direction,
            entry_price: fill_price,
            size,
            leverage: order.leverage,
            opened_at: now,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            hold_until: now + Duration::minutes(order.hold_minutes),
            unrealized_pnl: Decimal::ZERO,
        };
        tracing::info!(
            id = %position.id,
            direction = ?position.direction,
            %fill_price,
            size = %position.size,
            "position opened"
        );
        self.portfolio.open_positions.push(position.clone());
        position
    }

    /// One mark-to-market pass over every open position.
    ///
    /// Realizes stop, take-profit, and time exits, refreshes equity and the
    /// drawdown high-water mark, then applies the circuit breaker: a
    /// portfolio drawdown past the configured threshold liquidates the whole
    /// book at the current price, unconditionally.
    pub fn mark_to_market(&mut self, price: Decimal, now: DateTime<Utc>) -> Vec<ClosedPosition> {
        let mut closed = Vec::new();
        let mut unrealized = Decimal::ZERO;

        for mut position in std::mem::take(&mut self.portfolio.open_positions) {
            let pnl = position.pnl_at(price);
            match position.close_reason(price, now) {
                Some(reason) => {
                    self.portfolio.realized_equity += pnl;
                    tracing::info!(id = %position.id, ?reason, realized_pnl = %pnl, "position closed");
                    closed.push(ClosedPosition {
                        position,
                        exit_price: price,
                        closed_at: now,
                        realized_pnl: pnl,
                        reason,
                    });
                }
                None => {
                    position.unrealized_pnl = pnl;
                    unrealized += pnl;
                    self.portfolio.open_positions.push(position);
                }
            }
        }
        self.portfolio.unrealized_pnl = unrealized;
        self.portfolio.refresh();

        let drawdown = self.portfolio.drawdown();
        if drawdown > self.config.circuit_breaker_drawdown && self.portfolio.open_count() > 0 {
            tracing::warn!(
                drawdown,
                threshold = self.config.circuit_breaker_drawdown,
                open = self.portfolio.open_count(),
                "circuit breaker tripped, liquidating book"
            );
            for position in std::mem::take(&mut self.portfolio.open_positions) {
                let pnl = position.pnl_at(price);
                self.portfolio.realized_equity += pnl;
                closed.push(ClosedPosition {
                    position,
                    exit_price: price,
                    closed_at: now,
                    realized_pnl: pnl,
                    reason: CloseReason::CircuitBreaker,
                });
            }
            self.portfolio.unrealized_pnl = Decimal::ZERO;
            self.portfolio.refresh();
        }

        closed
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default()
}
