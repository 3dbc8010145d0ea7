//! tick-sim: single-tick decision loop for a simulated trading agent
//!
//! This library provides the core components for:
//! - Snapshot boundary types and validation for consolidated market data
//! - Weighted multi-family signal fusion into trade decisions
//! - Kelly-based, volatility-scaled risk sizing with stop/take/hold bounds
//! - Multi-venue execution simulation with bounded slippage and partial fills
//! - Position lifecycle, mark-to-market, and circuit-breaker liquidation
//! - Rolling-window performance tracking (Sharpe, win rate, trade drawdown)
//! - A tick orchestrator that sequences the pipeline and owns all state

pub mod config;
pub mod engine;
pub mod execution;
pub mod fusion;
pub mod market;
pub mod perf;
pub mod risk;
pub mod telemetry;
