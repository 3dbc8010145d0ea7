//! The per-tick pipeline driver
//!
//! Sequencing is strict: validate -> decide -> size -> execute -> register
//! fill -> mark-to-market -> performance. Validation happens before any
//! mutation, so a failed tick leaves no partial state behind.

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::execution::ExecutionSimulator;
use crate::fusion::{FusionEngine, Signal};
use crate::market::{MarketSnapshot, SnapshotError};
use crate::perf::PerformanceTracker;
use crate::risk::{PortfolioState, RiskSizer};

use super::report::TickReport;

/// Tick-level failures surfaced to the caller
#[derive(Debug, Error)]
pub enum TickError {
    /// The snapshot violated the ingestion boundary contract
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),
}

/// Owns and sequences the decision pipeline across ticks
pub struct Orchestrator {
    seed: Option<u64>,
    fusion: FusionEngine,
    sizer: RiskSizer,
    execution: ExecutionSimulator,
    performance: PerformanceTracker,
    tick: u64,
}

impl Orchestrator {
    /// Build an orchestrator, failing fast on configuration errors
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Build an orchestrator whose execution replays deterministically
    pub fn with_seed(config: Config, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, Some(seed))
    }

    fn build(config: Config, seed: Option<u64>) -> Result<Self, ConfigError> {
        config.validate()?;
        let execution = match seed {
            Some(seed) => ExecutionSimulator::with_seed(config.execution.clone(), seed),
            None => ExecutionSimulator::new(config.execution.clone()),
        };
        Ok(Self {
            seed,
            fusion: FusionEngine::new(config.fusion.clone()),
            sizer: RiskSizer::new(config.risk.clone()),
            execution,
            performance: PerformanceTracker::new(config.performance.clone()),
            tick: 0,
        })
    }

    /// Run one atomic tick of the pipeline.
    ///
    /// The same tick's close price marks every open position, whether or not
    /// a new order was placed.
    pub fn next(
        &mut self,
        snapshot: &MarketSnapshot,
        signals: &[Signal],
    ) -> Result<TickReport, TickError> {
        snapshot.validate()?;

        let decision = self.fusion.decide(snapshot, signals);
        let mut order = None;
        let mut execution = None;
        let mut performance = None;

        if let Some(sized) = self.sizer.evaluate(&decision, snapshot) {
            let report = self.execution.execute(&sized, snapshot)?;
            self.sizer
                .register_fill(&sized, report.average_price, snapshot.timestamp);
            performance = Some(self.performance.update(&report, &sized, snapshot.close));
            order = Some(sized);
            execution = Some(report);
        }

        let closed = self.sizer.mark_to_market(snapshot.close, snapshot.timestamp);
        for position in &closed {
            self.performance.record_close(position);
        }
        if !closed.is_empty() || performance.is_some() {
            performance = Some(
                self.performance
                    .snapshot(self.sizer.portfolio().unrealized_pnl),
            );
        }

        self.tick += 1;
        let portfolio = self.sizer.portfolio();
        tracing::info!(
            tick = self.tick,
            action = ?decision.action,
            equity = %portfolio.equity,
            drawdown = portfolio.drawdown(),
            open = portfolio.open_count(),
            closed = closed.len(),
            macro_bias = snapshot.macro_bias,
            sentiment_bias = snapshot.sentiment_bias,
            "tick complete"
        );

        Ok(TickReport {
            tick: self.tick,
            snapshot: snapshot.clone(),
            decision,
            order,
            execution,
            performance,
            closed,
            equity: portfolio.equity,
            drawdown: portfolio.drawdown(),
        })
    }

    /// Reinitialize every component from the given configuration.
    ///
    /// Used between independent runs; nothing survives from the prior run.
    /// A seeded orchestrator keeps its seed, so reset replays identically.
    pub fn reset(&mut self, config: Config) -> Result<(), ConfigError> {
        *self = Self::build(config, self.seed)?;
        Ok(())
    }

    /// Read-only view of the portfolio
    pub fn portfolio(&self) -> &PortfolioState {
        self.sizer.portfolio()
    }

    /// Ticks completed since construction or reset
    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}
