//! Kelly criterion sizing math
//!
//! The win-rate and reward:risk inputs are proxied from decision confidence.
//! The proxies are deliberately simple monotone maps; anything that stays in
//! (0, 1) and above zero respectively can be swapped in (e.g. a historically
//! calibrated estimator) without touching the sizing contract.

/// Kelly fraction for a directional bet: f* = p - (1 - p) / b,
/// clamped into [0, 1] so a negative edge sizes to nothing.
pub fn kelly_fraction(win_rate: f64, reward_risk: f64) -> f64 {
    if reward_risk <= 0.0 {
        return 0.0;
    }
    (win_rate - (1.0 - win_rate) / reward_risk).clamp(0.0, 1.0)
}

/// Map decision confidence to a win-rate estimate in (0, 1)
pub fn win_rate_proxy(confidence: f64) -> f64 {
    0.35 + 0.30 * confidence.clamp(0.0, 1.0)
}

/// Map decision confidence to a reward:risk estimate above zero
pub fn reward_risk_proxy(confidence: f64) -> f64 {
    1.1 + 0.8 * confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelly_positive_edge() {
        // p = 0.6, b = 2: f* = 0.6 - 0.4 / 2 = 0.4
        let f = kelly_fraction(0.6, 2.0);
        assert!((f - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_kelly_negative_edge_clamps_to_zero() {
        assert_eq!(kelly_fraction(0.3, 1.0), 0.0);
    }

    #[test]
    fn test_kelly_degenerate_reward_risk() {
        assert_eq!(kelly_fraction(0.9, 0.0), 0.0);
        assert_eq!(kelly_fraction(0.9, -1.0), 0.0);
    }

    #[test]
    fn test_kelly_never_exceeds_one() {
        assert!(kelly_fraction(1.0, 100.0) <= 1.0);
    }

    #[test]
    fn test_win_rate_proxy_bounds() {
        assert!((win_rate_proxy(0.0) - 0.35).abs() < 1e-9);
        assert!((win_rate_proxy(1.0) - 0.65).abs() < 1e-9);
        // Out-of-range confidence is clamped, keeping the proxy in (0, 1)
        assert!(win_rate_proxy(5.0) < 1.0);
        assert!(win_rate_proxy(-5.0) > 0.0);
    }

    #[test]
    fn test_reward_risk_proxy_positive_and_monotone() {
        assert!(reward_risk_proxy(0.0) > 0.0);
        assert!(reward_risk_proxy(0.9) > reward_risk_proxy(0.1));
    }
}
