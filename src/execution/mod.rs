//! Execution simulation module
//!
//! Turns sized orders into venue fills with bounded slippage

mod simulator;
mod types;

pub use simulator::ExecutionSimulator;
pub use types::{Direction, ExecutionReport, Fill, Order};
