//! Configuration types for tick-sim

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::fusion::WeightTable;
use crate::telemetry::LogFormat;

/// Configuration validation errors, raised at construction/reset time
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Initial equity must be positive
    #[error("initial equity must be positive, got {0}")]
    NonPositiveEquity(Decimal),
    /// A fractional field fell outside [0, 1]
    #[error("{name} must be within [0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },
    /// A multiplier or factor that must be strictly positive
    #[error("{name} must be positive, got {value}")]
    NonPositiveFactor { name: &'static str, value: f64 },
    /// Maximum leverage below 1 makes every order invalid
    #[error("max leverage must be at least 1, got {0}")]
    LeverageTooLow(f64),
    /// Hold window bounds are inverted or negative
    #[error("hold window invalid: min {min} max {max}")]
    InvalidHoldWindow { min: i64, max: i64 },
    /// Buy threshold must sit above zero
    #[error("buy threshold must be positive, got {0}")]
    BuyThresholdNotPositive(f64),
    /// Sell threshold must sit below zero
    #[error("sell threshold must be negative, got {0}")]
    SellThresholdNotNegative(f64),
    /// Regime volatility bands are inverted
    #[error("regime volatility bands inverted: confident {confident} >= uncertain {uncertain}")]
    VolatilityBandsInverted { confident: f64, uncertain: f64 },
    /// Simulated latency range is inverted
    #[error("latency range inverted: {min}..{max} ms")]
    LatencyRangeInverted { min: u64, max: u64 },
    /// A signal family weight override is negative
    #[error("weight for signal family {family} must be non-negative, got {weight}")]
    NegativeWeight { family: String, weight: f64 },
    /// The merged weight table carries no positive weight
    #[error("signal weight table has no positive weight")]
    EmptyWeightTable,
    /// Rolling returns window must hold at least one trade
    #[error("returns window must be non-zero")]
    ZeroReturnsWindow,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Decision fusion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FusionConfig {
    /// Fused score above which the decision is a buy
    #[serde(default = "default_buy_threshold")]
    pub buy_threshold: f64,

    /// Fused score below which the decision is a sell
    #[serde(default = "default_sell_threshold")]
    pub sell_threshold: f64,

    /// Confidence floor for non-hold decisions
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Partial overrides merged over the default family weight table
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,

    /// High-trust family whose agreement tightens thresholds
    #[serde(default = "default_trusted_family")]
    pub trusted_family: String,

    /// Minimum ensemble sign-agreement ratio for the alignment bonus
    #[serde(default = "default_alignment_floor")]
    pub alignment_floor: f64,

    /// Threshold multiplier applied when the alignment bonus fires
    #[serde(default = "default_alignment_factor")]
    pub alignment_factor: f64,

    /// Normalized volatility below which the regime is confident
    #[serde(default = "default_confident_vol")]
    pub confident_vol: f64,

    /// Normalized volatility above which the regime is uncertain
    #[serde(default = "default_uncertain_vol")]
    pub uncertain_vol: f64,

    /// Threshold multiplier in the confident regime
    #[serde(default = "default_confident_factor")]
    pub confident_factor: f64,

    /// Threshold multiplier in the uncertain regime
    #[serde(default = "default_uncertain_factor")]
    pub uncertain_factor: f64,

    /// Confidence bonus granted in the confident regime
    #[serde(default = "default_regime_bonus")]
    pub regime_bonus: f64,
}

fn default_buy_threshold() -> f64 {
    0.25
}
fn default_sell_threshold() -> f64 {
    -0.25
}
fn default_min_confidence() -> f64 {
    0.15
}
fn default_trusted_family() -> String {
    "harmonic".to_string()
}
fn default_alignment_floor() -> f64 {
    0.6
}
fn default_alignment_factor() -> f64 {
    0.85
}
fn default_confident_vol() -> f64 {
    0.004
}
fn default_uncertain_vol() -> f64 {
    0.015
}
fn default_confident_factor() -> f64 {
    0.75
}
fn default_uncertain_factor() -> f64 {
    1.4
}
fn default_regime_bonus() -> f64 {
    0.10
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            buy_threshold: default_buy_threshold(),
            sell_threshold: default_sell_threshold(),
            min_confidence: default_min_confidence(),
            weights: BTreeMap::new(),
            trusted_family: default_trusted_family(),
            alignment_floor: default_alignment_floor(),
            alignment_factor: default_alignment_factor(),
            confident_vol: default_confident_vol(),
            uncertain_vol: default_uncertain_vol(),
            confident_factor: default_confident_factor(),
            uncertain_factor: default_uncertain_factor(),
            regime_bonus: default_regime_bonus(),
        }
    }
}

/// Risk sizing and portfolio configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Starting equity for a fresh portfolio
    #[serde(default = "default_initial_equity")]
    pub initial_equity: Decimal,

    /// Cap on the portfolio fraction at risk in any single order
    #[serde(default = "default_max_portfolio_risk")]
    pub max_portfolio_risk: f64,

    /// Hard per-trade risk fraction cap
    #[serde(default = "default_risk_per_trade_cap")]
    pub risk_per_trade_cap: f64,

    /// Scale applied to the raw Kelly fraction
    #[serde(default = "default_kelly_multiplier")]
    pub kelly_multiplier: f64,

    /// Leverage ceiling for any order
    #[serde(default = "default_max_leverage")]
    pub max_leverage: f64,

    /// Stop distance as a multiple of close * normalized volatility
    #[serde(default = "default_stop_multiplier")]
    pub stop_multiplier: f64,

    /// Portfolio drawdown fraction that forces liquidation
    #[serde(default = "default_circuit_breaker_drawdown")]
    pub circuit_breaker_drawdown: f64,

    /// Minimum position hold window in minutes
    #[serde(default = "default_min_hold_minutes")]
    pub min_hold_minutes: i64,

    /// Maximum position hold window in minutes
    #[serde(default = "default_max_hold_minutes")]
    pub max_hold_minutes: i64,
}

fn default_initial_equity() -> Decimal {
    Decimal::new(100_000, 0)
}
fn default_max_portfolio_risk() -> f64 {
    0.20
}
fn default_risk_per_trade_cap() -> f64 {
    0.05
}
fn default_kelly_multiplier() -> f64 {
    0.5
}
fn default_max_leverage() -> f64 {
    5.0
}
fn default_stop_multiplier() -> f64 {
    1.5
}
fn default_circuit_breaker_drawdown() -> f64 {
    0.25
}
fn default_min_hold_minutes() -> i64 {
    5
}
fn default_max_hold_minutes() -> i64 {
    240
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            initial_equity: default_initial_equity(),
            max_portfolio_risk: default_max_portfolio_risk(),
            risk_per_trade_cap: default_risk_per_trade_cap(),
            kelly_multiplier: default_kelly_multiplier(),
            max_leverage: default_max_leverage(),
            stop_multiplier: default_stop_multiplier(),
            circuit_breaker_drawdown: default_circuit_breaker_drawdown(),
            min_hold_minutes: default_min_hold_minutes(),
            max_hold_minutes: default_max_hold_minutes(),
        }
    }
}

/// Execution simulation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Slippage clamp in basis points
    #[serde(default = "default_max_slippage_bps")]
    pub max_slippage_bps: u32,

    /// Probability of splitting an order into primary + residual fills
    #[serde(default = "default_partial_fill_prob")]
    pub partial_fill_prob: f64,

    /// Extra adverse basis points charged on the residual fill
    #[serde(default = "default_residual_penalty_bps")]
    pub residual_penalty_bps: u32,

    /// Lower bound of the simulated latency draw in milliseconds
    #[serde(default = "default_latency_ms_min")]
    pub latency_ms_min: u64,

    /// Upper bound of the simulated latency draw in milliseconds
    #[serde(default = "default_latency_ms_max")]
    pub latency_ms_max: u64,
}

fn default_max_slippage_bps() -> u32 {
    25
}
fn default_partial_fill_prob() -> f64 {
    0.2
}
fn default_residual_penalty_bps() -> u32 {
    5
}
fn default_latency_ms_min() -> u64 {
    5
}
fn default_latency_ms_max() -> u64 {
    50
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_slippage_bps: default_max_slippage_bps(),
            partial_fill_prob: default_partial_fill_prob(),
            residual_penalty_bps: default_residual_penalty_bps(),
            latency_ms_min: default_latency_ms_min(),
            latency_ms_max: default_latency_ms_max(),
        }
    }
}

/// Performance tracking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceConfig {
    /// Number of per-trade returns kept for Sharpe and win-rate stats
    #[serde(default = "default_returns_window")]
    pub returns_window: usize,
}

fn default_returns_window() -> usize {
    100
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            returns_window: default_returns_window(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter, e.g. "info" or "tick_sim=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check every invariant the tick loop relies on.
    ///
    /// Called once at orchestrator construction and reset so that a bad
    /// configuration can never surface mid-tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fusion = &self.fusion;
        if fusion.buy_threshold <= 0.0 {
            return Err(ConfigError::BuyThresholdNotPositive(fusion.buy_threshold));
        }
        if fusion.sell_threshold >= 0.0 {
            return Err(ConfigError::SellThresholdNotNegative(fusion.sell_threshold));
        }
        fraction("min_confidence", fusion.min_confidence)?;
        fraction("alignment_floor", fusion.alignment_floor)?;
        positive("alignment_factor", fusion.alignment_factor)?;
        positive("confident_factor", fusion.confident_factor)?;
        positive("uncertain_factor", fusion.uncertain_factor)?;
        fraction("regime_bonus", fusion.regime_bonus)?;
        if fusion.confident_vol >= fusion.uncertain_vol {
            return Err(ConfigError::VolatilityBandsInverted {
                confident: fusion.confident_vol,
                uncertain: fusion.uncertain_vol,
            });
        }
        for (family, weight) in &fusion.weights {
            if *weight < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    family: family.clone(),
                    weight: *weight,
                });
            }
        }
        if WeightTable::merged(&fusion.weights).total() <= 0.0 {
            return Err(ConfigError::EmptyWeightTable);
        }

        let risk = &self.risk;
        if risk.initial_equity <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveEquity(risk.initial_equity));
        }
        fraction("max_portfolio_risk", risk.max_portfolio_risk)?;
        fraction("risk_per_trade_cap", risk.risk_per_trade_cap)?;
        fraction("circuit_breaker_drawdown", risk.circuit_breaker_drawdown)?;
        if risk.kelly_multiplier < 0.0 {
            return Err(ConfigError::NonPositiveFactor {
                name: "kelly_multiplier",
                value: risk.kelly_multiplier,
            });
        }
        positive("stop_multiplier", risk.stop_multiplier)?;
        if risk.max_leverage < 1.0 {
            return Err(ConfigError::LeverageTooLow(risk.max_leverage));
        }
        if risk.min_hold_minutes < 0 || risk.min_hold_minutes > risk.max_hold_minutes {
            return Err(ConfigError::InvalidHoldWindow {
                min: risk.min_hold_minutes,
                max: risk.max_hold_minutes,
            });
        }

        let execution = &self.execution;
        fraction("partial_fill_prob", execution.partial_fill_prob)?;
        if execution.latency_ms_min > execution.latency_ms_max {
            return Err(ConfigError::LatencyRangeInverted {
                min: execution.latency_ms_min,
                max: execution.latency_ms_max,
            });
        }

        if self.performance.returns_window == 0 {
            return Err(ConfigError::ZeroReturnsWindow);
        }

        Ok(())
    }
}

fn fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::FractionOutOfRange { name, value });
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value <= 0.0 {
        return Err(ConfigError::NonPositiveFactor { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [fusion]
            buy_threshold = 0.3
            sell_threshold = -0.2
            trusted_family = "macro"

            [fusion.weights]
            ensemble = 0.5
            macro = 0.5

            [risk]
            initial_equity = 250000.0
            max_leverage = 3.0
            min_hold_minutes = 10
            max_hold_minutes = 120

            [execution]
            max_slippage_bps = 10
            partial_fill_prob = 0.0

            [performance]
            returns_window = 50

            [telemetry]
            log_level = "debug"
            log_format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.fusion.buy_threshold, 0.3);
        assert_eq!(config.fusion.weights["macro"], 0.5);
        assert_eq!(config.risk.initial_equity, dec!(250000));
        assert_eq!(config.execution.max_slippage_bps, 10);
        assert_eq!(config.performance.returns_window, 50);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[risk]\nmax_leverage = 2.0\n").unwrap();
        assert_eq!(config.risk.max_leverage, 2.0);
        assert_eq!(config.risk.min_hold_minutes, 5);
        assert_eq!(config.fusion.buy_threshold, 0.25);
    }

    #[test]
    fn test_rejects_negative_equity() {
        let mut config = Config::default();
        config.risk.initial_equity = dec!(-1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveEquity(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_hold_window() {
        let mut config = Config::default();
        config.risk.min_hold_minutes = 300;
        config.risk.max_hold_minutes = 60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHoldWindow { .. })
        ));
    }

    #[test]
    fn test_rejects_risk_cap_above_one() {
        let mut config = Config::default();
        config.risk.risk_per_trade_cap = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FractionOutOfRange { name, .. }) if name == "risk_per_trade_cap"
        ));
    }

    #[test]
    fn test_rejects_leverage_below_one() {
        let mut config = Config::default();
        config.risk.max_leverage = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LeverageTooLow(_))
        ));
    }

    #[test]
    fn test_rejects_positive_sell_threshold() {
        let mut config = Config::default();
        config.fusion.sell_threshold = 0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SellThresholdNotNegative(_))
        ));
    }

    #[test]
    fn test_rejects_negative_weight_override() {
        let mut config = Config::default();
        config.fusion.weights.insert("ensemble".to_string(), -0.4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn test_rejects_zeroed_weight_table() {
        let mut config = Config::default();
        for family in ["ensemble", "sentiment", "anomaly", "harmonic"] {
            config.fusion.weights.insert(family.to_string(), 0.0);
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyWeightTable)
        ));
    }

    #[test]
    fn test_rejects_inverted_latency_range() {
        let mut config = Config::default();
        config.execution.latency_ms_min = 100;
        config.execution.latency_ms_max = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LatencyRangeInverted { .. })
        ));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
