#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/meridian-labs/meridian/issues/")]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod capm;
pub mod forecast;

pub use capm::CapmConfig;
pub use forecast::ForecastTable;

use meridian_core::diag::Diagnostics;
use meridian_core::panel::PricePanel;
use ndarray::Array1;

/// Which expected-return model to run.
#[derive(Debug, Clone)]
pub enum ReturnModel {
    /// Look annual returns up in an externally supplied forecast table.
    Forecast(ForecastTable),
    /// CAPM estimate from the panel's own history.
    HistoricalCapm(CapmConfig),
}

/// An expected-return vector aligned with the panel's asset order.
#[derive(Debug, Clone)]
pub struct ReturnEstimate {
    /// Annualized expected return per asset, panel column order
    pub mu: Array1<f64>,
    /// Data-quality conditions observed during estimation
    pub diagnostics: Diagnostics,
}

/// Estimate annualized expected returns for every asset in the panel.
///
/// Never fails: any asset the chosen model cannot price is assigned 0.0
/// and flagged in the estimate's diagnostics.
pub fn expected_returns(panel: &PricePanel, model: &ReturnModel) -> ReturnEstimate {
    match model {
        ReturnModel::Forecast(table) => forecast::forecast_returns(panel, table),
        ReturnModel::HistoricalCapm(config) => capm::capm_returns(panel, config),
    }
}
