//! Ledoit-Wolf shrinkage
//!
//! Analytical shrinkage estimator from "Honey, I Shrunk the Sample
//! Covariance Matrix" (Ledoit & Wolf, 2004). The estimate blends the sample
//! covariance `S` with a structured target `F`:
//!
//! `Σ = δ* F + (1 - δ*) S`
//!
//! where the intensity `δ*` minimizes the expected squared Frobenius error
//! of the blend and is computed in closed form from the return history.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Structured target the sample covariance is shrunk toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkageTarget {
    /// `F = mean(var) * I`: identity scaled by the average sample variance
    #[default]
    Identity,
    /// `F = diag(S)`: sample variances, zero off-diagonals
    Diagonal,
    /// Sample variances with the average pairwise correlation everywhere
    ConstantCorrelation,
}

/// Result of a shrinkage estimation.
#[derive(Debug, Clone)]
pub struct Shrunk {
    /// The shrunk covariance matrix (same frequency as the input returns)
    pub covariance: Array2<f64>,
    /// The intensity `δ*` actually applied, in `[0, 1]`
    pub intensity: f64,
}

/// Ledoit-Wolf estimator with a configurable shrinkage target.
///
/// Returns are always centered before covariance computation; the divisor
/// is `n` (maximum-likelihood convention), matching the closed-form
/// intensity derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedoitWolf {
    target: ShrinkageTarget,
}

impl LedoitWolf {
    /// Estimator shrinking toward the given target.
    pub const fn new(target: ShrinkageTarget) -> Self {
        Self { target }
    }

    /// The configured target.
    pub const fn target(&self) -> ShrinkageTarget {
        self.target
    }

    /// Shrink the covariance of `returns` (rows = periods, columns =
    /// assets). Requires at least two rows; the caller is expected to
    /// handle shorter histories before invoking the estimator.
    pub fn estimate(&self, returns: ArrayView2<'_, f64>) -> Shrunk {
        let centered = center(returns);
        let sample = sample_covariance(&centered);
        let target = self.build_target(&sample);
        let intensity = self.shrinkage_intensity(&centered, &sample, &target);

        let covariance = &target * intensity + &sample * (1.0 - intensity);
        Shrunk {
            covariance,
            intensity,
        }
    }

    fn build_target(&self, sample: &Array2<f64>) -> Array2<f64> {
        let n = sample.nrows();
        match self.target {
            ShrinkageTarget::Identity => {
                let mean_var = sample.diag().sum() / n as f64;
                Array2::eye(n) * mean_var
            }
            ShrinkageTarget::Diagonal => Array2::from_diag(&sample.diag().to_owned()),
            ShrinkageTarget::ConstantCorrelation => {
                let stds = sample.diag().mapv(f64::sqrt);

                let mut corr_sum = 0.0;
                let mut pairs = 0usize;
                for i in 0..n {
                    for j in (i + 1)..n {
                        let denom = stds[i] * stds[j];
                        if denom > 0.0 {
                            corr_sum += sample[[i, j]] / denom;
                            pairs += 1;
                        }
                    }
                }
                let mean_corr = if pairs > 0 { corr_sum / pairs as f64 } else { 0.0 };

                Array2::from_shape_fn((n, n), |(i, j)| {
                    if i == j {
                        sample[[i, i]]
                    } else {
                        mean_corr * stds[i] * stds[j]
                    }
                })
            }
        }
    }
}

fn center(returns: ArrayView2<'_, f64>) -> Array2<f64> {
    // mean_axis is only None for zero rows, which the caller excludes
    match returns.mean_axis(Axis(0)) {
        Some(means) => &returns - &means.insert_axis(Axis(0)),
        None => returns.to_owned(),
    }
}

/// `S = X'X / n` over centered returns.
fn sample_covariance(centered: &Array2<f64>) -> Array2<f64> {
    let n = centered.nrows() as f64;
    centered.t().dot(centered) / n
}

impl LedoitWolf {
    /// Closed-form optimal intensity `δ* = clamp(κ̂ / n, 0, 1)` with
    /// `κ̂ = (π̂ - ρ̂) / γ̂`.
    ///
    /// `π̂` is the summed asymptotic variance of the sample covariance
    /// entries, `ρ̂` the part that also afflicts the target (zero for the
    /// deterministic identity target, the diagonal terms plus the
    /// average-correlation correction otherwise), and `γ̂` the squared
    /// Frobenius distance between sample and target.
    fn shrinkage_intensity(
        &self,
        centered: &Array2<f64>,
        sample: &Array2<f64>,
        target: &Array2<f64>,
    ) -> f64 {
        let (n_periods, n_assets) = centered.dim();
        let n = n_periods as f64;

        let mut pi = 0.0;
        let mut pi_diag = 0.0;
        for t in 0..n_periods {
            let row = centered.row(t);
            for i in 0..n_assets {
                for j in 0..n_assets {
                    let d = row[i] * row[j] - sample[[i, j]];
                    pi += d * d;
                    if i == j {
                        pi_diag += d * d;
                    }
                }
            }
        }
        pi /= n;
        pi_diag /= n;

        let rho = match self.target {
            ShrinkageTarget::Identity => 0.0,
            ShrinkageTarget::Diagonal => pi_diag,
            ShrinkageTarget::ConstantCorrelation => {
                pi_diag + mean_correlation(sample) * off_diagonal_rho(centered, sample)
            }
        };

        let mut gamma = 0.0;
        for i in 0..n_assets {
            for j in 0..n_assets {
                let d = sample[[i, j]] - target[[i, j]];
                gamma += d * d;
            }
        }

        if gamma > 0.0 {
            ((pi - rho) / gamma / n).clamp(0.0, 1.0)
        } else {
            // Sample already equals the target; nothing to shrink
            0.0
        }
    }
}

/// Average pairwise sample correlation, the `r̄` of the 2004 paper.
fn mean_correlation(sample: &Array2<f64>) -> f64 {
    let n = sample.nrows();
    let stds = sample.diag().mapv(f64::sqrt);
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let denom = stds[i] * stds[j];
            if denom > 0.0 {
                sum += sample[[i, j]] / denom;
                pairs += 1;
            }
        }
    }
    if pairs > 0 { sum / pairs as f64 } else { 0.0 }
}

/// Off-diagonal part of `ρ̂` for the constant-correlation target:
/// `Σ_{i≠j} (√(s_jj/s_ii) θ_ii,ij + √(s_ii/s_jj) θ_jj,ij) / 2` where
/// `θ_kk,ij` is the asymptotic covariance between `s_kk` and `s_ij`.
fn off_diagonal_rho(centered: &Array2<f64>, sample: &Array2<f64>) -> f64 {
    let (n_periods, n_assets) = centered.dim();
    let n = n_periods as f64;
    let stds = sample.diag().mapv(f64::sqrt);

    let mut sum = 0.0;
    for i in 0..n_assets {
        for j in 0..n_assets {
            if i == j || stds[i] <= 0.0 || stds[j] <= 0.0 {
                continue;
            }
            let mut theta_ii = 0.0;
            let mut theta_jj = 0.0;
            for t in 0..n_periods {
                let row = centered.row(t);
                let dij = row[i] * row[j] - sample[[i, j]];
                theta_ii += (row[i] * row[i] - sample[[i, i]]) * dij;
                theta_jj += (row[j] * row[j] - sample[[j, j]]) * dij;
            }
            theta_ii /= n;
            theta_jj /= n;
            sum += 0.5 * (stds[j] / stds[i] * theta_ii + stds[i] / stds[j] * theta_jj);
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn sample_covariance_of_known_data() {
        // Perfectly correlated pair, zero mean after centering
        let returns = array![[1.0, 2.0], [-1.0, -2.0], [0.0, 0.0]];
        let centered = center(returns.view());
        let cov = sample_covariance(&centered);

        assert_relative_eq!(cov[[0, 0]], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 4.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 8.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn identity_target_scales_average_variance() {
        let sample = array![[4.0, 1.0], [1.0, 2.0]];
        let target = LedoitWolf::new(ShrinkageTarget::Identity).build_target(&sample);

        assert_relative_eq!(target[[0, 0]], 3.0, epsilon = 1e-12);
        assert_relative_eq!(target[[1, 1]], 3.0, epsilon = 1e-12);
        assert_relative_eq!(target[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn diagonal_target_keeps_variances_only() {
        let sample = array![[4.0, 1.0], [1.0, 2.0]];
        let target = LedoitWolf::new(ShrinkageTarget::Diagonal).build_target(&sample);

        assert_relative_eq!(target[[0, 0]], 4.0, epsilon = 1e-12);
        assert_relative_eq!(target[[1, 1]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(target[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_correlation_target_uses_average_correlation() {
        // corr = 2 / (2 * 3) = 1/3
        let sample = array![[4.0, 2.0], [2.0, 9.0]];
        let target =
            LedoitWolf::new(ShrinkageTarget::ConstantCorrelation).build_target(&sample);

        assert_relative_eq!(target[[0, 0]], 4.0, epsilon = 1e-12);
        assert_relative_eq!(target[[1, 1]], 9.0, epsilon = 1e-12);
        assert_relative_eq!(target[[0, 1]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(target[[1, 0]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn intensity_stays_in_unit_interval() {
        let returns = array![
            [0.01, 0.02, -0.01],
            [-0.01, 0.01, 0.02],
            [0.02, -0.01, 0.01],
            [-0.02, 0.01, -0.01],
            [0.01, -0.02, 0.02],
            [0.02, 0.01, -0.02],
        ];
        let shrunk = LedoitWolf::default().estimate(returns.view());
        assert!((0.0..=1.0).contains(&shrunk.intensity));
    }

    #[test]
    fn shorter_histories_shrink_harder() {
        // The optimal intensity decays roughly as 1/n in the number of
        // observations, so a short sample of the same process must be
        // shrunk more aggressively than a long one
        let noisy = |rows: usize| {
            Array2::from_shape_fn((rows, 4), |(t, j)| {
                0.01 * ((t * 4 + j) as f64 * 0.7).sin() + 0.005 * ((t + j * 3) as f64 * 1.3).cos()
            })
        };
        let short = LedoitWolf::default().estimate(noisy(6).view());
        let long = LedoitWolf::default().estimate(noisy(120).view());

        assert!(short.intensity > 0.0);
        assert!(
            short.intensity > long.intensity,
            "short {} should exceed long {}",
            short.intensity,
            long.intensity
        );
    }

    #[test]
    fn estimate_is_symmetric_with_nonnegative_diagonal() {
        let returns = Array2::from_shape_fn((20, 4), |(t, j)| ((t + j * 7) as f64 * 0.31).cos());
        let shrunk = LedoitWolf::new(ShrinkageTarget::Diagonal).estimate(returns.view());

        let cov = &shrunk.covariance;
        for i in 0..4 {
            assert!(cov[[i, i]] >= 0.0);
            for j in 0..4 {
                assert_relative_eq!(cov[[i, j]], cov[[j, i]], epsilon = 1e-10);
            }
        }
    }
}
