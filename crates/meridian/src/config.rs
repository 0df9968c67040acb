//! Engine configuration
//!
//! Everything tunable is injected here rather than hardcoded in the
//! estimators: the risk-free rate, the annualization factor, the
//! score-to-volatility range, the cleaning threshold, and the shrinkage
//! target. The struct deserializes from a plain JSON object so deployments
//! can ship it as a config file.

use meridian_optimizer::RiskTargetRange;
use meridian_risk::ShrinkageTarget;
use serde::{Deserialize, Serialize};

/// Tunable parameters of the allocation pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annualized risk-free rate (CAPM intercept, Sharpe baseline,
    /// max-Sharpe objective)
    pub risk_free_rate: f64,
    /// Observation periods per year; 252 for daily trading data
    pub periods_per_year: f64,
    /// Volatility range the 1-10 risk score maps across
    pub risk_targets: RiskTargetRange,
    /// Weights below this are zeroed and the rest renormalized
    pub cleaning_threshold: f64,
    /// Structured target for Ledoit-Wolf covariance shrinkage
    pub shrinkage_target: ShrinkageTarget,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: 252.0,
            risk_targets: RiskTargetRange::default(),
            cleaning_threshold: 1e-4,
            shrinkage_target: ShrinkageTarget::Identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_the_product_parameters() {
        let config = EngineConfig::default();
        assert_relative_eq!(config.risk_free_rate, 0.02);
        assert_relative_eq!(config.periods_per_year, 252.0);
        assert_relative_eq!(config.risk_targets.min_vol, 0.05);
        assert_relative_eq!(config.risk_targets.max_vol, 0.25);
        assert_relative_eq!(config.cleaning_threshold, 1e-4);
    }

    #[test]
    fn deserializes_partial_overrides() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"risk_free_rate": 0.03}"#).unwrap();
        assert_relative_eq!(config.risk_free_rate, 0.03);
        assert_relative_eq!(config.periods_per_year, 252.0);
    }
}
