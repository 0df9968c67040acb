//! Portfolio performance evaluation

use ndarray::{Array1, Array2};
use serde::Serialize;

/// Annualized risk/return statistics for a weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Performance {
    /// `w . mu`
    pub expected_return: f64,
    /// `sqrt(w' Sigma w)`
    pub volatility: f64,
    /// `(expected_return - rf) / volatility`. A zero-volatility portfolio
    /// gets a signed-infinity sentinel (`+inf` for positive excess return,
    /// `-inf` for negative, `0.0` for exactly zero excess) rather than a
    /// silent NaN.
    pub sharpe: f64,
}

/// Evaluate a weight vector against the estimates it was optimized from.
pub fn evaluate(
    mu: &Array1<f64>,
    sigma: &Array2<f64>,
    weights: &[f64],
    risk_free_rate: f64,
) -> Performance {
    let w = Array1::from_vec(weights.to_vec());
    let expected_return = w.dot(mu);
    // The quadratic form can dip epsilon-negative after cleaning
    let variance = w.dot(&sigma.dot(&w)).max(0.0);
    let volatility = variance.sqrt();

    let excess = expected_return - risk_free_rate;
    let sharpe = if volatility > 0.0 {
        excess / volatility
    } else if excess > 0.0 {
        f64::INFINITY
    } else if excess < 0.0 {
        f64::NEG_INFINITY
    } else {
        0.0
    };

    Performance {
        expected_return,
        volatility,
        sharpe,
    }
}
