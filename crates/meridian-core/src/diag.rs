//! Degenerate-input diagnostics
//!
//! Estimators keep the silent best-effort contract (missing data becomes a
//! zero estimate, never an error) but record what they papered over so the
//! caller can surface a data-quality warning. Diagnostics are additive and
//! never abort a computation.

use serde::Serialize;

/// A non-fatal data-quality condition observed during estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "asset", rename_all = "snake_case")]
pub enum Degeneracy {
    /// Fewer than two usable observations; estimates defaulted to zero.
    TooFewObservations,
    /// An asset's return series has zero variance.
    ZeroVarianceAsset(String),
    /// An asset in the universe had no entry in the forecast table.
    MissingForecast(String),
    /// The market proxy has zero variance, so betas are undefined.
    FlatMarketProxy,
    /// The shrunk covariance matrix needed eigenvalue clipping to stay PSD.
    ClippedCovariance,
}

impl std::fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewObservations => write!(f, "fewer than two observations"),
            Self::ZeroVarianceAsset(asset) => write!(f, "zero-variance asset {asset}"),
            Self::MissingForecast(asset) => write!(f, "no forecast for {asset}, defaulted to 0"),
            Self::FlatMarketProxy => write!(f, "market proxy has zero variance"),
            Self::ClippedCovariance => write!(f, "covariance eigenvalues clipped to stay PSD"),
        }
    }
}

/// Accumulator for [`Degeneracy`] observations across pipeline stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Degeneracy>,
}

impl Diagnostics {
    /// Empty diagnostics.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record one condition, deduplicating repeats.
    pub fn record(&mut self, degeneracy: Degeneracy) {
        if !self.items.contains(&degeneracy) {
            self.items.push(degeneracy);
        }
    }

    /// Merge another set of diagnostics into this one.
    pub fn extend(&mut self, other: Self) {
        for item in other.items {
            self.record(item);
        }
    }

    /// Whether anything degenerate was observed.
    pub fn is_clean(&self) -> bool {
        self.items.is_empty()
    }

    /// The recorded conditions, in observation order.
    pub fn items(&self) -> &[Degeneracy] {
        &self.items
    }
}
