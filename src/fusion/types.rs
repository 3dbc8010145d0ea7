//! Fusion types

use serde::{Deserialize, Serialize};

/// Trade action for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Open or add long exposure
    Buy,
    /// Open or add short exposure
    Sell,
    /// Do nothing this tick
    Hold,
}

/// Volatility regime governing threshold width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Calm tape, thresholds narrow
    Confident,
    /// Baseline thresholds
    Neutral,
    /// Choppy tape, thresholds widen
    Uncertain,
}

/// One externally produced signal score
///
/// Signals are opaque to the fusion engine beyond their family name, score,
/// and confidence. Several signals may share a family (e.g. the ensemble
/// sub-scores) and are aggregated before weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Family name, e.g. "ensemble" or "sentiment"
    pub family: String,
    /// Directional score in [-1, 1]
    pub score: f64,
    /// Producer confidence in [0, 1]
    pub confidence: f64,
}

impl Signal {
    /// Create a signal, clamping score and confidence into their ranges
    pub fn new(family: impl Into<String>, score: f64, confidence: f64) -> Self {
        Self {
            family: family.into(),
            score: score.clamp(-1.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Per-family contribution to a fused decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentScore {
    /// Signal family
    pub family: String,
    /// Confidence-weighted family score
    pub score: f64,
    /// Mean family confidence
    pub confidence: f64,
    /// Normalized weight the family carried in the fused score
    pub weight: f64,
}

/// The fused outcome of one tick's signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Chosen action
    pub action: Action,
    /// Position size hint in [0, 1]
    pub size_hint: f64,
    /// Decision confidence in [0, 1], floored for non-hold actions
    pub confidence: f64,
    /// Regime in effect when the decision was made
    pub regime: Regime,
    /// Per-family contributions, for audit
    pub components: Vec<ComponentScore>,
}

impl Decision {
    /// A hold decision with no contributing components
    pub fn hold(regime: Regime) -> Self {
        Self {
            action: Action::Hold,
            size_hint: 0.0,
            confidence: 0.0,
            regime,
            components: vec![],
        }
    }
}
