//! Input file loading.
//!
//! The CLI reads three kinds of files: a wide CSV price panel (one `Date`
//! column plus one column per asset), a JSON forecast table, and an
//! optional JSON engine configuration. Blank price cells mean "no quote
//! that day"; the panel builder drops any date that is not complete across
//! the whole universe.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use meridian::{EngineConfig, ForecastTable, PanelError, PricePanel, PricePanelBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("price file needs a date column followed by at least one asset column")]
    MissingColumns,

    #[error("row {row}: cannot parse date {value:?} (expected YYYY-MM-DD)")]
    BadDate { row: usize, value: String },

    #[error("row {row}, {asset}: cannot parse price {value:?}")]
    BadPrice {
        row: usize,
        asset: String,
        value: String,
    },

    #[error(transparent)]
    Panel(#[from] PanelError),
}

fn open(path: &Path) -> Result<BufReader<File>, InputError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Load a wide CSV into a validated price panel.
pub(crate) fn load_price_panel(path: &Path) -> Result<PricePanel, InputError> {
    let mut reader = csv::Reader::from_reader(open(path)?);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(InputError::MissingColumns);
    }
    let assets: Vec<String> = headers.iter().skip(1).map(str::to_owned).collect();

    let mut builder = PricePanelBuilder::new(assets.iter().cloned());
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // +2: one for the header, one for 1-based line numbers
        let row = i + 2;

        let date_field = record.get(0).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|_| {
            InputError::BadDate {
                row,
                value: date_field.to_owned(),
            }
        })?;

        let mut prices = Vec::with_capacity(assets.len());
        for (j, asset) in assets.iter().enumerate() {
            let field = record.get(j + 1).unwrap_or("").trim();
            if field.is_empty() {
                prices.push(f64::NAN);
            } else {
                prices.push(field.parse::<f64>().map_err(|_| InputError::BadPrice {
                    row,
                    asset: asset.clone(),
                    value: field.to_owned(),
                })?);
            }
        }

        builder.push_row(date, &prices)?;
    }

    Ok(builder.build()?)
}

/// Load a `{"ASSET": annualized_return}` JSON object.
pub(crate) fn load_forecasts(path: &Path) -> Result<ForecastTable, InputError> {
    Ok(serde_json::from_reader(open(path)?)?)
}

/// Load the engine configuration, or fall back to the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig, InputError> {
    match path {
        Some(path) => Ok(serde_json::from_reader(open(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}
