//! Constrained mean-variance optimization
//!
//! Primary objective: maximize expected return under a volatility cap.
//! When the cap is unreachable the optimizer falls back to the
//! maximum-Sharpe portfolio under the same budget and bound constraints;
//! the fallback is a reported state, not an error. Only constraints that
//! admit no fully-invested portfolio at all are fatal.
//!
//! Clarabel's interior-point method carries no randomized state, so
//! identical inputs always produce identical weights.

use meridian_core::bounds::{AllocationBounds, BoundsError};
use meridian_core::linalg::{LinalgError, sqrt_psd};
use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::qp::{
    SolveOutcome, efficient_risk_problem, max_sharpe_problem, min_variance_problem,
};

/// Errors surfaced by the optimizer
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// No fully-invested portfolio satisfies the supplied constraints,
    /// even after discarding the volatility target
    #[error("Infeasible constraints: {0}")]
    InfeasibleConstraints(String),

    /// Bounds are malformed (outside `[0, 1]` or unordered)
    #[error(transparent)]
    InvalidBounds(BoundsError),

    /// Expected returns and covariance disagree on the universe size
    #[error("Dimension mismatch: mu has {mu} entries, sigma is {rows}x{cols}")]
    DimensionMismatch {
        /// Length of the expected-return vector
        mu: usize,
        /// Covariance row count
        rows: usize,
        /// Covariance column count
        cols: usize,
    },

    /// Covariance matrix is not symmetric
    #[error("Covariance matrix is unusable: {0}")]
    InvalidCovariance(#[from] LinalgError),

    /// Solver could not be constructed
    #[error("Solver error: {0}")]
    Solver(String),
}

/// Configuration for the optimizer.
#[derive(Debug, Clone, Copy)]
pub struct OptimizerConfig {
    /// Annualized risk-free rate used by the max-Sharpe fallback
    pub risk_free_rate: f64,
    /// Weights below this are zeroed before renormalization
    pub cleaning_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            cleaning_threshold: 1e-4,
        }
    }
}

/// A solved, cleaned, fully-invested portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedPortfolio {
    /// Weights in the same order as the inputs; sum to 1, within bounds
    pub weights: Vec<f64>,
    /// Whether the volatility target was unreachable and the max-Sharpe
    /// fallback produced these weights instead
    pub fallback: bool,
}

/// Solve for the optimal weights at the given target volatility.
///
/// Numerical non-convergence is retried once with relaxed tolerances; a
/// primary solve that still cannot converge is treated as infeasible and
/// routed to the fallback, and a fallback that cannot converge is a hard
/// [`OptimizerError::InfeasibleConstraints`].
pub fn optimize(
    mu: &Array1<f64>,
    sigma: &Array2<f64>,
    bounds: AllocationBounds,
    target_volatility: f64,
    config: &OptimizerConfig,
) -> Result<OptimizedPortfolio, OptimizerError> {
    let n = mu.len();
    if sigma.nrows() != n || sigma.ncols() != n {
        return Err(OptimizerError::DimensionMismatch {
            mu: n,
            rows: sigma.nrows(),
            cols: sigma.ncols(),
        });
    }
    match bounds.validate(n) {
        Ok(()) => {}
        Err(err @ BoundsError::Malformed { .. }) => {
            return Err(OptimizerError::InvalidBounds(err));
        }
        Err(err @ BoundsError::Infeasible { .. }) => {
            return Err(OptimizerError::InfeasibleConstraints(err.to_string()));
        }
    }

    let sigma_sqrt = sqrt_psd(sigma)?;

    let primary = efficient_risk_problem(mu, &sigma_sqrt, bounds, target_volatility);
    if let SolveOutcome::Optimal(raw) = primary.solve_with_retry()? {
        return Ok(OptimizedPortfolio {
            weights: clean_weights(&raw, config.cleaning_threshold)?,
            fallback: false,
        });
    }

    // Target volatility unreachable: best risk-adjusted portfolio instead
    let raw = solve_fallback(mu, sigma, bounds, config)?;
    Ok(OptimizedPortfolio {
        weights: clean_weights(&raw, config.cleaning_threshold)?,
        fallback: true,
    })
}

/// Max-Sharpe under the same constraints; minimum-variance when no asset
/// beats the risk-free rate (the Sharpe supremum then sits at minimal
/// volatility and the homogenized program has no feasible point).
fn solve_fallback(
    mu: &Array1<f64>,
    sigma: &Array2<f64>,
    bounds: AllocationBounds,
    config: &OptimizerConfig,
) -> Result<Vec<f64>, OptimizerError> {
    let rf = config.risk_free_rate;

    if mu.iter().all(|&m| m <= rf) {
        let problem = min_variance_problem(sigma, bounds);
        return match problem.solve_with_retry()? {
            SolveOutcome::Optimal(w) => Ok(w),
            _ => Err(OptimizerError::InfeasibleConstraints(
                "minimum-variance fallback did not converge".into(),
            )),
        };
    }

    let problem = max_sharpe_problem(mu, sigma, rf, bounds);
    match problem.solve_with_retry()? {
        SolveOutcome::Optimal(y) => {
            let total: f64 = y.iter().sum();
            if total <= 0.0 {
                return Err(OptimizerError::InfeasibleConstraints(
                    "max-Sharpe substitution produced a non-positive budget".into(),
                ));
            }
            Ok(y.iter().map(|v| v / total).collect())
        }
        _ => Err(OptimizerError::InfeasibleConstraints(
            "max-Sharpe fallback is infeasible under the supplied bounds".into(),
        )),
    }
}

/// Zero out numerical dust below `threshold` and renormalize to an exact
/// unit sum. Raw interior-point output carries noise that must not be
/// presented as meaningful micro-allocations.
fn clean_weights(raw: &[f64], threshold: f64) -> Result<Vec<f64>, OptimizerError> {
    let mut weights: Vec<f64> = raw
        .iter()
        .map(|&w| if w < threshold { 0.0 } else { w })
        .collect();

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(OptimizerError::InfeasibleConstraints(
            "all weights vanished during cleaning".into(),
        ));
    }
    for w in &mut weights {
        *w /= total;
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn three_asset_inputs() -> (Array1<f64>, Array2<f64>) {
        let mu = array![0.08, 0.05, 0.03];
        let sigma = Array2::from_diag(&array![0.04, 0.01, 0.0025]);
        (mu, sigma)
    }

    fn portfolio_variance(sigma: &Array2<f64>, w: &[f64]) -> f64 {
        let w = Array1::from_vec(w.to_vec());
        w.dot(&sigma.dot(&w))
    }

    #[test]
    fn feasible_target_is_hit_without_fallback() {
        let (mu, sigma) = three_asset_inputs();
        let result = optimize(
            &mu,
            &sigma,
            AllocationBounds::default(),
            0.1,
            &OptimizerConfig::default(),
        )
        .unwrap();

        assert!(!result.fallback);
        let sum: f64 = result.weights.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        for &w in &result.weights {
            assert!((-1e-6..=1.0 + 1e-6).contains(&w));
        }
        assert!(portfolio_variance(&sigma, &result.weights) <= 0.01 + 1e-6);
        // Tilted toward the highest-return asset up to the risk cap:
        // the optimum is the 40/60 two-asset mix returning 6.2%
        let ret: f64 = mu
            .iter()
            .zip(&result.weights)
            .map(|(m, w)| m * w)
            .sum();
        assert!(ret >= 0.0619, "expected near-optimal return, got {ret}");
        assert_abs_diff_eq!(result.weights[0], 0.4, epsilon = 1e-3);
        assert_abs_diff_eq!(result.weights[1], 0.6, epsilon = 1e-3);
        assert_abs_diff_eq!(result.weights[2], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn unreachable_target_falls_back_to_max_sharpe() {
        // Both assets are far too volatile for a 1% volatility target
        let mu = array![0.08, 0.05];
        let sigma = Array2::from_diag(&array![0.09, 0.16]);
        let result = optimize(
            &mu,
            &sigma,
            AllocationBounds::default(),
            0.01,
            &OptimizerConfig::default(),
        )
        .unwrap();

        assert!(result.fallback);
        let sum: f64 = result.weights.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        for &w in &result.weights {
            assert!((-1e-6..=1.0 + 1e-6).contains(&w));
        }
    }

    #[test]
    fn impossible_bounds_are_a_hard_error() {
        // Two assets forced to 0.6 each must sum to 1.2, never 1.0
        let mu = array![0.08, 0.05];
        let sigma = Array2::from_diag(&array![0.04, 0.01]);
        let err = optimize(
            &mu,
            &sigma,
            AllocationBounds::new(0.6, 0.6),
            0.1,
            &OptimizerConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, OptimizerError::InfeasibleConstraints(_)));
    }

    #[test]
    fn no_positive_excess_return_resolves_to_min_variance() {
        // Nothing beats the risk-free rate; fallback must still produce
        // a valid portfolio (the minimum-variance one: 1:4 mix)
        let mu = array![0.000, 0.010];
        let sigma = Array2::from_diag(&array![0.04, 0.01]);
        let result = optimize(
            &mu,
            &sigma,
            AllocationBounds::default(),
            0.005,
            &OptimizerConfig::default(),
        )
        .unwrap();

        assert!(result.fallback);
        assert_abs_diff_eq!(result.weights[0], 0.2, epsilon = 1e-4);
        assert_abs_diff_eq!(result.weights[1], 0.8, epsilon = 1e-4);
    }

    #[test]
    fn identical_inputs_give_identical_weights() {
        let (mu, sigma) = three_asset_inputs();
        let config = OptimizerConfig::default();
        let first =
            optimize(&mu, &sigma, AllocationBounds::default(), 0.1, &config).unwrap();
        let second =
            optimize(&mu, &sigma, AllocationBounds::default(), 0.1, &config).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mu = array![0.08, 0.05, 0.03];
        let sigma = Array2::from_diag(&array![0.04, 0.01]);
        assert!(matches!(
            optimize(
                &mu,
                &sigma,
                AllocationBounds::default(),
                0.1,
                &OptimizerConfig::default()
            ),
            Err(OptimizerError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn cleaning_removes_numerical_dust() {
        // Generous cap: everything lands on the dominant asset and the
        // other weights are solver noise to be zeroed exactly
        let mu = array![0.10, 0.02];
        let sigma = Array2::from_diag(&array![0.01, 0.01]);
        let result = optimize(
            &mu,
            &sigma,
            AllocationBounds::default(),
            0.15,
            &OptimizerConfig::default(),
        )
        .unwrap();

        assert!(!result.fallback);
        assert_eq!(result.weights[1], 0.0);
        let sum: f64 = result.weights.iter().sum();
        assert_eq!(sum, 1.0);
    }

    #[test]
    fn clean_weights_renormalizes_exactly() {
        let cleaned = clean_weights(&[0.499_999, 0.499_999, 5e-7], 1e-4).unwrap();
        assert_eq!(cleaned[2], 0.0);
        let sum: f64 = cleaned.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tight_equal_bounds_that_sum_to_one_are_feasible() {
        // 4 assets pinned at exactly 0.25: only one portfolio exists
        let mu = array![0.08, 0.05, 0.03, 0.02];
        let sigma = Array2::from_diag(&array![0.04, 0.01, 0.0025, 0.0025]);
        let result = optimize(
            &mu,
            &sigma,
            AllocationBounds::new(0.25, 0.25),
            0.25,
            &OptimizerConfig::default(),
        )
        .unwrap();

        for &w in &result.weights {
            assert_abs_diff_eq!(w, 0.25, epsilon = 1e-5);
        }
    }
}
