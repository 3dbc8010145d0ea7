//! Fusion engine
//!
//! Aggregates signals per family, weights families into a fused score, and
//! applies the regime- and alignment-adjusted thresholds.

use std::collections::BTreeMap;

use crate::config::FusionConfig;
use crate::market::MarketSnapshot;

use super::types::{Action, ComponentScore, Decision, Regime, Signal};
use super::weights::WeightTable;

/// Family whose internal agreement gates the alignment bonus
const ENSEMBLE_FAMILY: &str = "ensemble";

/// Per-family aggregate of raw signals
#[derive(Debug, Clone, Copy)]
struct FamilyAggregate {
    score: f64,
    confidence: f64,
}

/// Fuses external signal scores into a trade decision
pub struct FusionEngine {
    config: FusionConfig,
    weights: WeightTable,
}

impl FusionEngine {
    /// Build a fusion engine; the weight table is merged once and frozen
    pub fn new(config: FusionConfig) -> Self {
        let weights = WeightTable::merged(&config.weights);
        Self { config, weights }
    }

    /// Fuse one tick's signals into a decision. Total: always yields a
    /// decision, falling back to hold when nothing carries confidence.
    pub fn decide(&self, snapshot: &MarketSnapshot, signals: &[Signal]) -> Decision {
        let regime = self.classify_regime(snapshot);
        let aggregates = aggregate_families(signals);
        if aggregates.is_empty() {
            return Decision::hold(regime);
        }

        let normalized = self
            .weights
            .normalized_over(aggregates.keys().map(String::as_str));

        let mut fused = 0.0;
        let mut external_confidence = 0.0;
        let mut components = Vec::with_capacity(aggregates.len());
        for (family, aggregate) in &aggregates {
            let weight = normalized.get(family).copied().unwrap_or(0.0);
            fused += weight * aggregate.score;
            external_confidence += weight * aggregate.confidence;
            components.push(ComponentScore {
                family: family.clone(),
                score: aggregate.score,
                confidence: aggregate.confidence,
                weight,
            });
        }

        let mut scale = match regime {
            Regime::Confident => self.config.confident_factor,
            Regime::Neutral => 1.0,
            Regime::Uncertain => self.config.uncertain_factor,
        };
        if self.alignment_bonus(signals, &aggregates) {
            scale *= self.config.alignment_factor;
        }

        let buy_threshold = self.config.buy_threshold * scale;
        let sell_threshold = self.config.sell_threshold * scale;
        let action = if fused > buy_threshold {
            Action::Buy
        } else if fused < sell_threshold {
            Action::Sell
        } else {
            Action::Hold
        };

        let regime_bonus = if regime == Regime::Confident {
            self.config.regime_bonus
        } else {
            0.0
        };
        let confidence = (fused.abs() + external_confidence + regime_bonus)
            .min(1.0)
            .max(self.config.min_confidence);

        tracing::debug!(
            ?action,
            fused,
            buy_threshold,
            sell_threshold,
            ?regime,
            "fused signals"
        );

        Decision {
            action,
            size_hint: fused.abs().min(1.0),
            confidence,
            regime,
            components,
        }
    }

    /// Classify the tick's volatility regime
    fn classify_regime(&self, snapshot: &MarketSnapshot) -> Regime {
        let vol = snapshot.normalized_volatility();
        if vol < self.config.confident_vol {
            Regime::Confident
        } else if vol > self.config.uncertain_vol {
            Regime::Uncertain
        } else {
            Regime::Neutral
        }
    }

    /// Thresholds tighten when the trusted family agrees with the ensemble
    /// direction and the ensemble's sub-scores agree among themselves.
    fn alignment_bonus(
        &self,
        signals: &[Signal],
        aggregates: &BTreeMap<String, FamilyAggregate>,
    ) -> bool {
        let trusted = match aggregates.get(&self.config.trusted_family) {
            Some(aggregate) if aggregate.score != 0.0 => aggregate,
            _ => return false,
        };
        let ensemble = match aggregates.get(ENSEMBLE_FAMILY) {
            Some(aggregate) if aggregate.score != 0.0 => aggregate,
            _ => return false,
        };
        if trusted.score.signum() != ensemble.score.signum() {
            return false;
        }

        let (mut positive, mut negative) = (0usize, 0usize);
        for signal in signals.iter().filter(|s| s.family == ENSEMBLE_FAMILY) {
            if signal.score > 0.0 {
                positive += 1;
            } else if signal.score < 0.0 {
                negative += 1;
            }
        }
        let total = positive + negative;
        if total == 0 {
            return false;
        }
        let agreement = positive.max(negative) as f64 / total as f64;
        agreement >= self.config.alignment_floor
    }
}

/// Confidence-weighted mean score and mean confidence per family
fn aggregate_families(signals: &[Signal]) -> BTreeMap<String, FamilyAggregate> {
    let mut grouped: BTreeMap<String, Vec<&Signal>> = BTreeMap::new();
    for signal in signals {
        grouped.entry(signal.family.clone()).or_default().push(signal);
    }

    grouped
        .into_iter()
        .map(|(family, members)| {
            let confidence_sum: f64 = members.iter().map(|s| s.confidence).sum();
            let score = if confidence_sum > 0.0 {
                members
                    .iter()
                    .map(|s| s.score * s.confidence)
                    .sum::<f64>()
                    / confidence_sum
            } else {
                0.0
            };
            let confidence = confidence_sum / members.len() as f64;
            (family, FamilyAggregate { score, confidence })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::market::VenueQuote;

    fn snapshot_with_range(high: Decimal, low: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            timestamp: Utc::now(),
            open: dec!(50000),
            high,
            low,
            close: dec!(50000),
            volume: dec!(900),
            venues: vec![VenueQuote {
                venue_id: "alpha".to_string(),
                price: dec!(50000),
                spread: 0.0006,
                volume: dec!(40),
                latency_ms: 10,
            }],
            macro_bias: 0.0,
            sentiment_bias: 0.0,
        }
    }

    fn neutral_snapshot() -> MarketSnapshot {
        // Range 500/50000 = 1% sits between the default regime bands
        snapshot_with_range(dec!(50250), dec!(49750))
    }

    fn engine() -> FusionEngine {
        FusionEngine::new(FusionConfig::default())
    }

    #[test]
    fn test_no_signals_holds() {
        let decision = engine().decide(&neutral_snapshot(), &[]);
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.size_hint, 0.0);
    }

    #[test]
    fn test_zero_confidence_holds() {
        let signals = vec![
            Signal::new("ensemble", 0.9, 0.0),
            Signal::new("sentiment", -0.8, 0.0),
        ];
        let decision = engine().decide(&neutral_snapshot(), &signals);
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.size_hint, 0.0);
    }

    #[test]
    fn test_strong_ensemble_buys() {
        let signals = vec![
            Signal::new("ensemble", 0.8, 0.9),
            Signal::new("ensemble", 0.7, 0.8),
            Signal::new("sentiment", 0.5, 0.6),
        ];
        let decision = engine().decide(&neutral_snapshot(), &signals);
        assert_eq!(decision.action, Action::Buy);
        assert!(decision.size_hint > 0.0);
        assert!(decision.confidence > 0.5);
    }

    #[test]
    fn test_strong_negative_sells() {
        let signals = vec![Signal::new("ensemble", -0.9, 0.9)];
        let decision = engine().decide(&neutral_snapshot(), &signals);
        assert_eq!(decision.action, Action::Sell);
    }

    #[test]
    fn test_scaling_invariant_fusion() {
        // Weight tables that differ only by a common factor fuse identically
        let mut small = FusionConfig::default();
        small.weights.insert("ensemble".to_string(), 0.1);
        small.weights.insert("sentiment".to_string(), 0.3);
        let mut large = FusionConfig::default();
        large.weights.insert("ensemble".to_string(), 1.0);
        large.weights.insert("sentiment".to_string(), 3.0);

        let signals = vec![
            Signal::new("ensemble", 0.9, 0.8),
            Signal::new("sentiment", -0.4, 0.7),
        ];
        let snap = neutral_snapshot();
        let a = FusionEngine::new(small).decide(&snap, &signals);
        let b = FusionEngine::new(large).decide(&snap, &signals);

        assert_eq!(a.action, b.action);
        assert!((a.size_hint - b.size_hint).abs() < 1e-9);
        assert!((a.confidence - b.confidence).abs() < 1e-9);
        for (ca, cb) in a.components.iter().zip(&b.components) {
            assert!((ca.weight - cb.weight).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uncertain_regime_widens_thresholds() {
        // 3% range pushes the regime to uncertain: 0.25 * 1.4 = 0.35
        let choppy = snapshot_with_range(dec!(50750), dec!(49250));
        let signals = vec![Signal::new("ensemble", 0.3, 1.0)];

        let calm_decision = engine().decide(&neutral_snapshot(), &signals);
        let choppy_decision = engine().decide(&choppy, &signals);

        assert_eq!(calm_decision.action, Action::Buy);
        assert_eq!(choppy_decision.action, Action::Hold);
        assert_eq!(choppy_decision.regime, Regime::Uncertain);
    }

    #[test]
    fn test_confident_regime_narrows_thresholds() {
        // 0.1% range: confident regime scales 0.25 down to 0.1875
        let calm = snapshot_with_range(dec!(50025), dec!(49975));
        let signals = vec![Signal::new("ensemble", 0.2, 1.0)];
        let decision = engine().decide(&calm, &signals);
        assert_eq!(decision.regime, Regime::Confident);
        assert_eq!(decision.action, Action::Buy);
    }

    #[test]
    fn test_alignment_bonus_tightens_thresholds() {
        // Zero-weight the trusted family so flipping it moves only the
        // thresholds, never the fused score. Fused score is 0.24, between
        // the aligned threshold (0.25 * 0.85 = 0.2125) and the plain 0.25.
        let mut config = FusionConfig::default();
        config.weights.insert("harmonic".to_string(), 0.0);
        let engine = FusionEngine::new(config);

        let agreeing = vec![
            Signal::new("ensemble", 0.24, 0.9),
            Signal::new("ensemble", 0.24, 0.9),
            Signal::new("harmonic", 0.5, 0.4),
        ];
        let mut disagreeing = agreeing.clone();
        disagreeing[2] = Signal::new("harmonic", -0.5, 0.4);

        let snap = neutral_snapshot();
        let with_bonus = engine.decide(&snap, &agreeing);
        assert_eq!(with_bonus.action, Action::Buy);

        // Trusted family flipped: bonus off, same fused score, wider threshold.
        let without_bonus = engine.decide(&snap, &disagreeing);
        assert_eq!(without_bonus.action, Action::Hold);
    }

    #[test]
    fn test_split_ensemble_blocks_alignment() {
        let signals = vec![
            Signal::new("ensemble", 0.9, 0.9),
            Signal::new("ensemble", -0.5, 0.9),
            Signal::new("harmonic", 0.5, 0.5),
        ];
        let decision = engine().decide(&neutral_snapshot(), &signals);
        // 50/50 agreement sits below the 0.6 floor; no tightening applies
        let aggregates = aggregate_families(&signals);
        assert!(!engine().alignment_bonus(&signals, &aggregates));
        assert!(decision.confidence >= FusionConfig::default().min_confidence);
    }

    #[test]
    fn test_confidence_floor_applies() {
        let signals = vec![Signal::new("ensemble", 0.05, 0.01)];
        let decision = engine().decide(&neutral_snapshot(), &signals);
        assert!(decision.confidence >= FusionConfig::default().min_confidence);
    }

    #[test]
    fn test_unknown_family_is_ignored() {
        let signals = vec![
            Signal::new("ensemble", 0.8, 0.9),
            Signal::new("astrology", -1.0, 1.0),
        ];
        let decision = engine().decide(&neutral_snapshot(), &signals);
        assert_eq!(decision.action, Action::Buy);
        let unknown = decision
            .components
            .iter()
            .find(|c| c.family == "astrology")
            .unwrap();
        assert_eq!(unknown.weight, 0.0);
    }
}
