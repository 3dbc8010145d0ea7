//! Risk management module
//!
//! Kelly-based order sizing, portfolio state, position lifecycle, and the
//! circuit-breaker fail-safe

mod kelly;
mod portfolio;
mod sizer;

pub use kelly::{kelly_fraction, reward_risk_proxy, win_rate_proxy};
pub use portfolio::{CloseReason, ClosedPosition, PortfolioState, Position};
pub use sizer::RiskSizer;
