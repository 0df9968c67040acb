//! Per-asset allocation bounds
//!
//! A single `(lower, upper)` pair applied uniformly to every asset weight.
//! Feasibility of a fully-invested portfolio requires the bounds to admit a
//! weight vector summing to one: `n * upper >= 1` and `n * lower <= 1`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by bounds validation
#[derive(Debug, Error, PartialEq)]
pub enum BoundsError {
    /// Lower or upper bound outside `[0, 1]`, or lower > upper
    #[error("Allocation bounds ({lower}, {upper}) are not ordered within [0, 1]")]
    Malformed {
        /// Lower bound supplied
        lower: f64,
        /// Upper bound supplied
        upper: f64,
    },

    /// No fully-invested portfolio exists for this universe size
    #[error(
        "Bounds ({lower}, {upper}) cannot sum to 1 across {n_assets} assets \
         (capacity {min_total}..{max_total})"
    )]
    Infeasible {
        /// Lower bound supplied
        lower: f64,
        /// Upper bound supplied
        upper: f64,
        /// Number of assets in the universe
        n_assets: usize,
        /// Smallest achievable total weight
        min_total: f64,
        /// Largest achievable total weight
        max_total: f64,
    },
}

/// Uniform lower/upper bound applied to every asset weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationBounds {
    /// Lower bound on each weight
    pub lower: f64,
    /// Upper bound on each weight
    pub upper: f64,
}

impl Default for AllocationBounds {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

/// Slack applied to the capacity check so that exact-capacity bounds
/// (e.g. 4 assets at upper = 0.25) pass despite rounding.
const CAPACITY_TOL: f64 = 1e-9;

impl AllocationBounds {
    /// Bounds with the given limits.
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Long-only with a per-asset cap, the usual diversification rule.
    pub const fn long_only_capped(upper: f64) -> Self {
        Self { lower: 0.0, upper }
    }

    /// Check that a fully-invested portfolio of `n_assets` weights can
    /// exist within these bounds.
    pub fn validate(&self, n_assets: usize) -> Result<(), BoundsError> {
        if !self.lower.is_finite()
            || !self.upper.is_finite()
            || self.lower < 0.0
            || self.upper > 1.0
            || self.lower > self.upper
        {
            return Err(BoundsError::Malformed {
                lower: self.lower,
                upper: self.upper,
            });
        }

        let min_total = self.lower * n_assets as f64;
        let max_total = self.upper * n_assets as f64;
        if min_total > 1.0 + CAPACITY_TOL || max_total < 1.0 - CAPACITY_TOL {
            return Err(BoundsError::Infeasible {
                lower: self.lower,
                upper: self.upper,
                n_assets,
                min_total,
                max_total,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 1.0, 3)]
    #[case(0.0, 0.25, 4)] // exact capacity
    #[case(0.1, 0.5, 4)]
    #[case(0.25, 0.25, 4)] // degenerate but exactly feasible
    fn accepts_feasible_bounds(#[case] lower: f64, #[case] upper: f64, #[case] n: usize) {
        AllocationBounds::new(lower, upper).validate(n).unwrap();
    }

    #[rstest]
    #[case(0.6, 0.6, 2)] // capacity 1.2..1.2, cannot hit 1.0
    #[case(0.0, 0.3, 3)] // max total 0.9 < 1
    fn rejects_infeasible_capacity(#[case] lower: f64, #[case] upper: f64, #[case] n: usize) {
        assert!(matches!(
            AllocationBounds::new(lower, upper).validate(n),
            Err(BoundsError::Infeasible { .. })
        ));
    }

    #[rstest]
    #[case(-0.1, 0.5)]
    #[case(0.5, 0.2)]
    #[case(0.0, 1.5)]
    #[case(f64::NAN, 1.0)]
    fn rejects_malformed_bounds(#[case] lower: f64, #[case] upper: f64) {
        assert!(matches!(
            AllocationBounds::new(lower, upper).validate(3),
            Err(BoundsError::Malformed { .. })
        ));
    }
}
