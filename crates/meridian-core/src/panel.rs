//! Historical price panel
//!
//! A [`PricePanel`] is the single input every estimator consumes: one column
//! per asset, one row per observation date, chronologically ascending and
//! free of missing values. Rows with any missing price are dropped at build
//! time so the retained date range is complete for every asset.

use chrono::NaiveDate;
use ndarray::Array2;
use thiserror::Error;

/// Errors raised while constructing a price panel
#[derive(Debug, Error)]
pub enum PanelError {
    /// No assets supplied
    #[error("Price panel needs at least one asset")]
    EmptyUniverse,

    /// The same asset identifier appears twice
    #[error("Duplicate asset identifier: {0}")]
    DuplicateAsset(String),

    /// No usable observation rows remain
    #[error("Price panel has no complete observation rows")]
    NoObservations,

    /// Row length does not match the asset universe
    #[error("Row for {date} has {actual} prices, expected {expected}")]
    RowLength {
        /// Observation date of the offending row
        date: NaiveDate,
        /// Number of prices expected (one per asset)
        expected: usize,
        /// Number of prices supplied
        actual: usize,
    },

    /// The same observation date appears twice
    #[error("Duplicate observation date: {0}")]
    DuplicateDate(NaiveDate),

    /// Dates are not strictly ascending
    #[error("Observation dates are not sorted ascending at {0}")]
    UnsortedDates(NaiveDate),

    /// A price is zero, negative, or non-finite
    #[error("Invalid price {price} for {asset} on {date}")]
    InvalidPrice {
        /// Asset identifier
        asset: String,
        /// Observation date
        date: NaiveDate,
        /// Offending value
        price: f64,
    },
}

/// An ordered-by-date panel of asset prices with no missing values.
#[derive(Debug, Clone)]
pub struct PricePanel {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Array2<f64>,
}

impl PricePanel {
    /// Construct a panel from pre-validated parts.
    ///
    /// `prices` is row-major with one row per date and one column per asset.
    /// Dates must be strictly ascending and every price strictly positive
    /// and finite.
    pub fn new(
        assets: Vec<String>,
        dates: Vec<NaiveDate>,
        prices: Array2<f64>,
    ) -> Result<Self, PanelError> {
        if assets.is_empty() {
            return Err(PanelError::EmptyUniverse);
        }
        for (i, asset) in assets.iter().enumerate() {
            if assets[..i].contains(asset) {
                return Err(PanelError::DuplicateAsset(asset.clone()));
            }
        }
        if dates.is_empty() {
            return Err(PanelError::NoObservations);
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return if pair[1] == pair[0] {
                    Err(PanelError::DuplicateDate(pair[1]))
                } else {
                    Err(PanelError::UnsortedDates(pair[1]))
                };
            }
        }
        if prices.nrows() != dates.len() || prices.ncols() != assets.len() {
            return Err(PanelError::RowLength {
                date: dates[0],
                expected: assets.len(),
                actual: prices.ncols(),
            });
        }
        for ((row, col), &price) in prices.indexed_iter() {
            if !price.is_finite() || price <= 0.0 {
                return Err(PanelError::InvalidPrice {
                    asset: assets[col].clone(),
                    date: dates[row],
                    price,
                });
            }
        }

        Ok(Self {
            assets,
            dates,
            prices,
        })
    }

    /// Asset identifiers, in column order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Observation dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The price matrix (rows = dates, columns = assets).
    pub const fn prices(&self) -> &Array2<f64> {
        &self.prices
    }

    /// Number of assets in the universe.
    pub fn n_assets(&self) -> usize {
        self.prices.ncols()
    }

    /// Number of observation rows.
    pub fn n_observations(&self) -> usize {
        self.prices.nrows()
    }

    /// Column index of an asset identifier, if present.
    pub fn asset_index(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Simple percentage returns between consecutive rows.
    ///
    /// The first row has no predecessor and is dropped, so the result has
    /// `n_observations() - 1` rows (zero rows for a single-observation
    /// panel, never an error).
    pub fn simple_returns(&self) -> Array2<f64> {
        let n_obs = self.n_observations();
        let n_assets = self.n_assets();
        if n_obs < 2 {
            return Array2::zeros((0, n_assets));
        }

        let mut returns = Array2::zeros((n_obs - 1, n_assets));
        for t in 1..n_obs {
            for j in 0..n_assets {
                let prev = self.prices[[t - 1, j]];
                returns[[t - 1, j]] = (self.prices[[t, j]] - prev) / prev;
            }
        }
        returns
    }
}

/// Incremental builder that tolerates missing observations.
///
/// Rows are collected in any order; `build` sorts them by date, rejects
/// duplicates, and drops every row containing a missing price (`NaN`), the
/// same alignment a long-to-wide pivot with `dropna` performs upstream.
#[derive(Debug)]
pub struct PricePanelBuilder {
    assets: Vec<String>,
    rows: Vec<(NaiveDate, Vec<f64>)>,
}

impl PricePanelBuilder {
    /// Start a builder for the given asset universe.
    pub fn new<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Add one observation row; `NaN` marks a missing price.
    pub fn push_row(&mut self, date: NaiveDate, prices: &[f64]) -> Result<&mut Self, PanelError> {
        if prices.len() != self.assets.len() {
            return Err(PanelError::RowLength {
                date,
                expected: self.assets.len(),
                actual: prices.len(),
            });
        }
        self.rows.push((date, prices.to_vec()));
        Ok(self)
    }

    /// Sort, drop incomplete rows, and validate into a [`PricePanel`].
    pub fn build(mut self) -> Result<PricePanel, PanelError> {
        self.rows.sort_by_key(|(date, _)| *date);
        for pair in self.rows.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(PanelError::DuplicateDate(pair[0].0));
            }
        }

        let complete: Vec<&(NaiveDate, Vec<f64>)> = self
            .rows
            .iter()
            .filter(|(_, prices)| prices.iter().all(|p| !p.is_nan()))
            .collect();
        if complete.is_empty() {
            return Err(PanelError::NoObservations);
        }

        let dates: Vec<NaiveDate> = complete.iter().map(|(date, _)| *date).collect();
        let flat: Vec<f64> = complete
            .iter()
            .flat_map(|(_, prices)| prices.iter().copied())
            .collect();
        let prices = Array2::from_shape_vec((dates.len(), self.assets.len()), flat)
            .map_err(|_| PanelError::NoObservations)?;

        PricePanel::new(self.assets, dates, prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn two_asset_panel() -> PricePanel {
        let prices =
            Array2::from_shape_vec((3, 2), vec![100.0, 50.0, 110.0, 45.0, 99.0, 54.0]).unwrap();
        PricePanel::new(
            vec!["AAA".into(), "BBB".into()],
            vec![date(1), date(2), date(3)],
            prices,
        )
        .unwrap()
    }

    #[test]
    fn simple_returns_match_hand_computation() {
        let panel = two_asset_panel();
        let returns = panel.simple_returns();

        assert_eq!(returns.dim(), (2, 2));
        assert_relative_eq!(returns[[0, 0]], 0.10, epsilon = 1e-12);
        assert_relative_eq!(returns[[0, 1]], -0.10, epsilon = 1e-12);
        assert_relative_eq!(returns[[1, 0]], -11.0 / 110.0, epsilon = 1e-12);
        assert_relative_eq!(returns[[1, 1]], 0.20, epsilon = 1e-12);
    }

    #[test]
    fn single_observation_yields_empty_returns() {
        let prices = Array2::from_shape_vec((1, 2), vec![100.0, 50.0]).unwrap();
        let panel =
            PricePanel::new(vec!["AAA".into(), "BBB".into()], vec![date(1)], prices).unwrap();
        assert_eq!(panel.simple_returns().nrows(), 0);
    }

    #[test]
    fn rejects_duplicate_assets() {
        let prices = Array2::from_shape_vec((1, 2), vec![1.0, 2.0]).unwrap();
        let err = PricePanel::new(vec!["AAA".into(), "AAA".into()], vec![date(1)], prices)
            .unwrap_err();
        assert!(matches!(err, PanelError::DuplicateAsset(_)));
    }

    #[test]
    fn rejects_unsorted_dates() {
        let prices = Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap();
        let err = PricePanel::new(vec!["AAA".into()], vec![date(2), date(1)], prices).unwrap_err();
        assert!(matches!(err, PanelError::UnsortedDates(_)));
    }

    #[test]
    fn rejects_non_positive_prices() {
        let prices = Array2::from_shape_vec((1, 1), vec![0.0]).unwrap();
        let err = PricePanel::new(vec!["AAA".into()], vec![date(1)], prices).unwrap_err();
        assert!(matches!(err, PanelError::InvalidPrice { .. }));
    }

    #[test]
    fn builder_drops_incomplete_rows_and_sorts() {
        let mut builder = PricePanelBuilder::new(["AAA", "BBB"]);
        builder.push_row(date(3), &[99.0, 54.0]).unwrap();
        builder.push_row(date(1), &[100.0, 50.0]).unwrap();
        builder.push_row(date(2), &[110.0, f64::NAN]).unwrap();
        let panel = builder.build().unwrap();

        assert_eq!(panel.dates(), &[date(1), date(3)]);
        assert_eq!(panel.n_observations(), 2);
        assert_relative_eq!(panel.prices()[[1, 0]], 99.0);
    }

    #[test]
    fn builder_rejects_duplicate_dates() {
        let mut builder = PricePanelBuilder::new(["AAA"]);
        builder.push_row(date(1), &[100.0]).unwrap();
        builder.push_row(date(1), &[101.0]).unwrap();
        assert!(matches!(
            builder.build().unwrap_err(),
            PanelError::DuplicateDate(_)
        ));
    }

    #[test]
    fn asset_index_lookup() {
        let panel = two_asset_panel();
        assert_eq!(panel.asset_index("BBB"), Some(1));
        assert_eq!(panel.asset_index("CCC"), None);
    }
}
