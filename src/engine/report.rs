//! Composite tick result

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::execution::{ExecutionReport, Order};
use crate::fusion::Decision;
use crate::market::MarketSnapshot;
use crate::perf::PerformanceSnapshot;
use crate::risk::ClosedPosition;

/// Everything one tick produced, as plain data.
///
/// This is the orchestrator's only output; an external recorder can persist
/// it opaquely. `closed` lists every position realized this tick, which makes
/// circuit-breaker liquidations auditable in the tick they happen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick counter
    pub tick: u64,
    /// The snapshot the tick ran against
    pub snapshot: MarketSnapshot,
    /// The fused decision
    pub decision: Decision,
    /// The sized order, when the decision was actionable
    pub order: Option<Order>,
    /// Simulated execution of the order
    pub execution: Option<ExecutionReport>,
    /// Performance view, present when a trade entered or closed this tick
    pub performance: Option<PerformanceSnapshot>,
    /// Positions realized this tick
    pub closed: Vec<ClosedPosition>,
    /// Portfolio equity after mark-to-market
    pub equity: Decimal,
    /// Portfolio drawdown fraction after mark-to-market
    pub drawdown: f64,
}
