//! Annualized covariance from a price panel
//!
//! Pipeline: simple returns -> Ledoit-Wolf shrinkage -> annualization ->
//! PSD repair. Degenerate inputs (short history, flat assets) produce a
//! best-effort estimate plus diagnostics, never an error.

use meridian_core::diag::{Degeneracy, Diagnostics};
use meridian_core::linalg::clip_to_psd;
use meridian_core::panel::PricePanel;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::shrinkage::{LedoitWolf, ShrinkageTarget};

/// Configuration for the risk estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Observation periods per year used to annualize (252 for daily data)
    pub periods_per_year: f64,
    /// Shrinkage target for the Ledoit-Wolf blend
    pub target: ShrinkageTarget,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 252.0,
            target: ShrinkageTarget::Identity,
        }
    }
}

/// An annualized covariance estimate with its provenance.
#[derive(Debug, Clone)]
pub struct RiskEstimate {
    /// Annualized covariance matrix, symmetric and PSD
    pub covariance: Array2<f64>,
    /// Shrinkage intensity applied (0 when history was too short to shrink)
    pub shrinkage: f64,
    /// Data-quality conditions observed along the way
    pub diagnostics: Diagnostics,
}

/// Variance below which an asset's return series counts as flat.
const FLAT_VARIANCE_TOL: f64 = 1e-16;

/// Estimate the annualized covariance matrix of a price panel.
///
/// A panel with fewer than three observations (fewer than two returns)
/// yields a zero matrix flagged with
/// [`Degeneracy::TooFewObservations`] so downstream consumers can still
/// run and warn.
pub fn annualized_covariance(panel: &PricePanel, config: &RiskConfig) -> RiskEstimate {
    let mut diagnostics = Diagnostics::new();
    let n_assets = panel.n_assets();

    let returns = panel.simple_returns();
    if returns.nrows() < 2 {
        diagnostics.record(Degeneracy::TooFewObservations);
        return RiskEstimate {
            covariance: Array2::zeros((n_assets, n_assets)),
            shrinkage: 0.0,
            diagnostics,
        };
    }

    for (j, column) in returns.axis_iter(Axis(1)).enumerate() {
        let mean = column.sum() / column.len() as f64;
        let var = column.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / column.len() as f64;
        if var < FLAT_VARIANCE_TOL {
            diagnostics.record(Degeneracy::ZeroVarianceAsset(panel.assets()[j].clone()));
        }
    }

    let shrunk = LedoitWolf::new(config.target).estimate(returns.view());
    let annualized = shrunk.covariance * config.periods_per_year;

    // Shrinkage preserves PSD in exact arithmetic; repair rounding damage.
    // The blend of symmetric matrices is symmetric, so the clip cannot
    // reject its input; the fallback arm only keeps the estimator total.
    let covariance = match clip_to_psd(&annualized) {
        Ok((repaired, was_clipped)) => {
            if was_clipped {
                diagnostics.record(Degeneracy::ClippedCovariance);
            }
            repaired
        }
        Err(err) => {
            debug_assert!(false, "shrunk covariance failed symmetry check: {err}");
            annualized
        }
    };

    RiskEstimate {
        covariance,
        shrinkage: shrunk.intensity,
        diagnostics,
    }
}

/// Pearson correlation matrix of the panel's simple returns.
///
/// Flat assets get zero correlation against everything (unit diagonal kept),
/// mirroring how the estimate is displayed rather than erroring out.
pub fn correlation_matrix(panel: &PricePanel) -> Array2<f64> {
    let returns = panel.simple_returns();
    let n_assets = panel.n_assets();
    if returns.nrows() < 2 {
        return Array2::eye(n_assets);
    }

    let n = returns.nrows() as f64;
    let means = returns.sum_axis(Axis(0)) / n;
    let centered = &returns - &means.insert_axis(Axis(0));
    let cov = centered.t().dot(&centered) / n;
    let stds = cov.diag().mapv(f64::sqrt);

    Array2::from_shape_fn((n_assets, n_assets), |(i, j)| {
        if i == j {
            1.0
        } else {
            let denom = stds[i] * stds[j];
            if denom > 0.0 { cov[[i, j]] / denom } else { 0.0 }
        }
    })
}
