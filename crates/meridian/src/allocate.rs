//! The allocation pipeline
//!
//! Wires the estimators and the optimizer together for one request:
//! expected returns and shrunk covariance are computed independently from
//! the panel, the risk score becomes a volatility target, the optimizer
//! produces cleaned weights (possibly via the max-Sharpe fallback), and
//! the evaluator prices the result. Stateless: every call receives a
//! fresh panel and parameters, nothing is cached.

use meridian_core::bounds::AllocationBounds;
use meridian_core::diag::Diagnostics;
use meridian_core::panel::PricePanel;
use meridian_optimizer::performance::Performance;
use meridian_optimizer::{OptimizerConfig, OptimizerError, optimize, target_volatility};
use meridian_returns::{CapmConfig, ForecastTable, ReturnModel, expected_returns};
use meridian_risk::estimator::{RiskConfig, annualized_covariance};

use crate::config::EngineConfig;

/// Which expected-return model the request should run.
#[derive(Debug, Clone)]
pub enum ModelSelector {
    /// Forward-looking consensus estimates supplied as data
    ForecastTable(ForecastTable),
    /// CAPM estimate from the panel's own history
    HistoricalCapm,
}

/// One allocation request.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    /// Expected-return model to use
    pub model: ModelSelector,
    /// Client risk preference, 1 (conservative) to 10 (aggressive)
    pub risk_score: u8,
    /// Per-asset weight bounds
    pub bounds: AllocationBounds,
}

/// A solved allocation: weights aligned with the panel's asset order plus
/// the statistics and provenance a presentation layer needs.
#[derive(Debug, Clone)]
pub struct Allocation {
    assets: Vec<String>,
    weights: Vec<f64>,
    /// Annualized performance of the solved weights
    pub performance: Performance,
    /// The volatility target the risk score mapped to
    pub target_volatility: f64,
    /// True when the target was unreachable and the max-Sharpe fallback
    /// produced the weights instead
    pub fallback: bool,
    /// Data-quality conditions observed by the estimators
    pub diagnostics: Diagnostics,
}

impl Allocation {
    /// Asset identifiers, in panel column order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// `(asset, weight)` pairs in panel column order.
    pub fn weights(&self) -> impl Iterator<Item = (&str, f64)> {
        self.assets
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    /// Weight of one asset, if it is in the universe.
    pub fn weight(&self, asset: &str) -> Option<f64> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.weights[i])
    }
}

/// Run the full pipeline for one request.
///
/// The only hard failure is [`OptimizerError::InfeasibleConstraints`]
/// (plus malformed inputs); degenerate data degrades to a best-effort
/// result carried in [`Allocation::diagnostics`].
pub fn allocate(
    panel: &PricePanel,
    request: &AllocationRequest,
    config: &EngineConfig,
) -> Result<Allocation, OptimizerError> {
    let model = match &request.model {
        ModelSelector::ForecastTable(table) => ReturnModel::Forecast(table.clone()),
        ModelSelector::HistoricalCapm => ReturnModel::HistoricalCapm(CapmConfig {
            risk_free_rate: config.risk_free_rate,
            periods_per_year: config.periods_per_year,
        }),
    };
    let returns = expected_returns(panel, &model);

    let risk = annualized_covariance(
        panel,
        &RiskConfig {
            periods_per_year: config.periods_per_year,
            target: config.shrinkage_target,
        },
    );

    let mut diagnostics = returns.diagnostics;
    diagnostics.extend(risk.diagnostics);

    let target = target_volatility(request.risk_score, config.risk_targets);
    let solved = optimize(
        &returns.mu,
        &risk.covariance,
        request.bounds,
        target,
        &OptimizerConfig {
            risk_free_rate: config.risk_free_rate,
            cleaning_threshold: config.cleaning_threshold,
        },
    )?;

    let performance = meridian_optimizer::evaluate(
        &returns.mu,
        &risk.covariance,
        &solved.weights,
        config.risk_free_rate,
    );

    Ok(Allocation {
        assets: panel.assets().to_vec(),
        weights: solved.weights,
        performance,
        target_volatility: target,
        fallback: solved.fallback,
        diagnostics,
    })
}
