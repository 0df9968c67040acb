//! Risk-score to volatility-target mapping
//!
//! Client risk preference arrives as an ordinal score from 1 (most
//! conservative) to 10 (most aggressive) and maps linearly onto an
//! annualized volatility target. Scores outside the range are clamped;
//! supplying one is a caller contract violation, not an error condition.

use serde::{Deserialize, Serialize};

/// Volatility range the 1-10 score interpolates across.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskTargetRange {
    /// Target at score 1
    pub min_vol: f64,
    /// Target at score 10
    pub max_vol: f64,
}

impl Default for RiskTargetRange {
    fn default() -> Self {
        Self {
            min_vol: 0.05,
            max_vol: 0.25,
        }
    }
}

/// Annualized target volatility for a risk score.
///
/// `target = min_vol + (max_vol - min_vol) * (score - 1) / 9`, with the
/// score clamped into `[1, 10]` first.
pub fn target_volatility(score: u8, range: RiskTargetRange) -> f64 {
    let score = score.clamp(1, 10);
    range.min_vol + (range.max_vol - range.min_vol) * f64::from(score - 1) / 9.0
}
