//! Forecast-table expected returns
//!
//! Forward-looking analyst estimates are configuration data, not logic:
//! the table arrives from the caller (typically deserialized from a file)
//! and is reindexed against the panel's asset universe. Assets without an
//! entry default to 0.0 and are flagged.

use std::collections::BTreeMap;

use meridian_core::diag::{Degeneracy, Diagnostics};
use meridian_core::panel::PricePanel;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::ReturnEstimate;

/// Externally supplied map from asset identifier to annualized expected
/// return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastTable {
    entries: BTreeMap<String, f64>,
}

impl ForecastTable {
    /// Empty table (every lookup will zero-fill).
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Forecast for one asset, if present.
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.entries.get(asset).copied()
    }

    /// Insert or replace one forecast.
    pub fn insert(&mut self, asset: impl Into<String>, annual_return: f64) {
        self.entries.insert(asset.into(), annual_return);
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ForecastTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Reindex the table against the panel's asset order, zero-filling and
/// flagging assets without a forecast.
pub fn forecast_returns(panel: &PricePanel, table: &ForecastTable) -> ReturnEstimate {
    let mut diagnostics = Diagnostics::new();
    let mu = Array1::from_iter(panel.assets().iter().map(|asset| {
        table.get(asset).unwrap_or_else(|| {
            diagnostics.record(Degeneracy::MissingForecast(asset.clone()));
            0.0
        })
    }));

    ReturnEstimate { mu, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use meridian_core::panel::PricePanelBuilder;

    fn panel(assets: &[&str]) -> PricePanel {
        let mut builder = PricePanelBuilder::new(assets.iter().copied());
        let row = vec![100.0; assets.len()];
        builder
            .push_row(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &row)
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn reindexes_to_panel_order() {
        let table: ForecastTable =
            [("BBB", 0.05), ("AAA", 0.08), ("CCC", 0.03)].into_iter().collect();
        let estimate = forecast_returns(&panel(&["CCC", "AAA", "BBB"]), &table);

        assert_relative_eq!(estimate.mu[0], 0.03);
        assert_relative_eq!(estimate.mu[1], 0.08);
        assert_relative_eq!(estimate.mu[2], 0.05);
        assert!(estimate.diagnostics.is_clean());
    }

    #[test]
    fn missing_entry_zero_fills_and_flags() {
        let table: ForecastTable = [("AAA", 0.08)].into_iter().collect();
        let estimate = forecast_returns(&panel(&["AAA", "NEW"]), &table);

        assert_relative_eq!(estimate.mu[1], 0.0);
        assert!(estimate
            .diagnostics
            .items()
            .contains(&Degeneracy::MissingForecast("NEW".into())));
    }

    #[test]
    fn extra_table_entries_are_ignored() {
        let table: ForecastTable = [("AAA", 0.08), ("UNUSED", 0.99)].into_iter().collect();
        let estimate = forecast_returns(&panel(&["AAA"]), &table);

        assert_eq!(estimate.mu.len(), 1);
        assert_relative_eq!(estimate.mu[0], 0.08);
    }

    #[test]
    fn deserializes_from_plain_json_map() {
        let table: ForecastTable =
            serde_json::from_str(r#"{"AAA": 0.0794, "BBB": 0.0354}"#).unwrap();
        assert_relative_eq!(table.get("AAA").unwrap(), 0.0794);
        assert_eq!(table.len(), 2);
    }
}
