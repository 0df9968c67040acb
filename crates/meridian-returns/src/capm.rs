//! CAPM expected returns
//!
//! `μ_i = rf + β_i (r_m − rf)` where `β_i` is the regression slope of
//! asset `i`'s returns on a market proxy and `r_m` the proxy's annualized
//! mean return. With no external benchmark available, the proxy is the
//! equal-weighted average of the panel's own columns.

use meridian_core::diag::{Degeneracy, Diagnostics};
use meridian_core::panel::PricePanel;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

use crate::ReturnEstimate;

/// Configuration for the CAPM estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CapmConfig {
    /// Annualized risk-free rate
    pub risk_free_rate: f64,
    /// Observation periods per year used to annualize the proxy mean
    pub periods_per_year: f64,
}

impl Default for CapmConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: 252.0,
        }
    }
}

/// Variance below which the market proxy counts as flat and betas are
/// undefined (treated as zero).
const FLAT_PROXY_TOL: f64 = 1e-16;

/// CAPM estimate for every asset in the panel.
///
/// Degenerate histories never fail: fewer than two returns gives a zero
/// vector, a flat proxy gives every asset `β = 0` (so `μ = rf`); both are
/// flagged in the diagnostics.
pub fn capm_returns(panel: &PricePanel, config: &CapmConfig) -> ReturnEstimate {
    let mut diagnostics = Diagnostics::new();
    let n_assets = panel.n_assets();

    let returns = panel.simple_returns();
    let n_periods = returns.nrows();
    if n_periods < 2 {
        diagnostics.record(Degeneracy::TooFewObservations);
        return ReturnEstimate {
            mu: Array1::zeros(n_assets),
            diagnostics,
        };
    }
    let n = n_periods as f64;

    // Equal-weighted market proxy, one value per period
    let proxy = returns.mean_axis(Axis(1)).unwrap_or_else(|| Array1::zeros(n_periods));
    let proxy_mean = proxy.sum() / n;
    let proxy_var = proxy.iter().map(|m| (m - proxy_mean).powi(2)).sum::<f64>() / n;

    let rf = config.risk_free_rate;
    let market_annual = proxy_mean * config.periods_per_year;
    let excess_market = market_annual - rf;

    if proxy_var < FLAT_PROXY_TOL {
        diagnostics.record(Degeneracy::FlatMarketProxy);
        return ReturnEstimate {
            mu: Array1::from_elem(n_assets, rf),
            diagnostics,
        };
    }

    let mu = Array1::from_iter(returns.axis_iter(Axis(1)).map(|column| {
        let mean = column.sum() / n;
        let cov = column
            .iter()
            .zip(proxy.iter())
            .map(|(r, m)| (r - mean) * (m - proxy_mean))
            .sum::<f64>()
            / n;
        let beta = cov / proxy_var;
        rf + beta * excess_market
    }));

    ReturnEstimate { mu, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use meridian_core::panel::PricePanelBuilder;

    fn panel_from_prices(assets: &[&str], rows: &[&[f64]]) -> PricePanel {
        let mut builder = PricePanelBuilder::new(assets.iter().copied());
        for (i, row) in rows.iter().enumerate() {
            let date =
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64);
            builder.push_row(date, row).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn beta_of_flat_asset_is_zero_and_proxy_beta_doubles() {
        // Asset A returns exactly [0.1, -0.1, 0.05]; asset B is flat.
        // Proxy = A/2, so beta_A = 2 and beta_B = 0.
        let panel = panel_from_prices(
            &["A", "B"],
            &[
                &[100.0, 10.0],
                &[110.0, 10.0],
                &[99.0, 10.0],
                &[103.95, 10.0],
            ],
        );
        let config = CapmConfig {
            risk_free_rate: 0.02,
            periods_per_year: 252.0,
        };
        let estimate = capm_returns(&panel, &config);

        let market_annual = (0.1 - 0.1 + 0.05) / 3.0 / 2.0 * 252.0;
        let expected_a = 0.02 + 2.0 * (market_annual - 0.02);
        assert_relative_eq!(estimate.mu[0], expected_a, max_relative = 1e-9);
        // beta 0 collapses to the risk-free rate
        assert_relative_eq!(estimate.mu[1], 0.02, max_relative = 1e-9);
        assert!(estimate.diagnostics.is_clean());
    }

    #[test]
    fn too_short_history_gives_zeros_with_flag() {
        let panel = panel_from_prices(&["A", "B"], &[&[100.0, 10.0], &[101.0, 10.1]]);
        let estimate = capm_returns(&panel, &CapmConfig::default());

        assert!(estimate.mu.iter().all(|&m| m == 0.0));
        assert!(estimate
            .diagnostics
            .items()
            .contains(&Degeneracy::TooFewObservations));
    }

    #[test]
    fn flat_proxy_collapses_to_risk_free_rate() {
        // Every asset flat: the proxy has zero variance
        let panel = panel_from_prices(
            &["A", "B"],
            &[&[10.0, 20.0], &[10.0, 20.0], &[10.0, 20.0], &[10.0, 20.0]],
        );
        let estimate = capm_returns(&panel, &CapmConfig::default());

        assert!(estimate.mu.iter().all(|&m| (m - 0.02).abs() < 1e-12));
        assert!(estimate
            .diagnostics
            .items()
            .contains(&Degeneracy::FlatMarketProxy));
    }

    #[test]
    fn estimates_are_finite_for_noisy_data() {
        let panel = panel_from_prices(
            &["A", "B", "C"],
            &[
                &[100.0, 50.0, 20.0],
                &[101.0, 49.0, 20.4],
                &[99.5, 50.5, 20.1],
                &[102.0, 49.5, 20.6],
                &[101.5, 50.2, 20.3],
            ],
        );
        let estimate = capm_returns(&panel, &CapmConfig::default());
        assert!(estimate.mu.iter().all(|m| m.is_finite()));
        assert_eq!(estimate.mu.len(), 3);
    }
}
