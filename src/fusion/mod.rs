//! Decision fusion module
//!
//! Combines externally scored signal families into one trade decision

mod engine;
mod types;
mod weights;

pub use engine::FusionEngine;
pub use types::{Action, ComponentScore, Decision, Regime, Signal};
pub use weights::WeightTable;
