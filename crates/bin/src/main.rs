//! Meridian CLI binary.
//!
//! Loads a price panel and a return model from files, runs the allocation
//! pipeline, and renders the result as text or JSON.

mod input;
mod report;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use meridian::{
    Allocation, AllocationBounds, AllocationRequest, EngineConfig, ModelSelector, allocate,
};

#[derive(Parser)]
#[command(name = "meridian")]
#[command(about = "Meridian: risk-targeted portfolio construction", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one allocation for a client risk score
    Optimize {
        /// Wide CSV of daily prices (a Date column plus one column per asset)
        #[arg(long)]
        prices: PathBuf,

        /// Client risk score, 1 (conservative) to 10 (aggressive)
        #[arg(long)]
        risk_score: u8,

        /// JSON object of annualized return forecasts per asset
        #[arg(long, conflicts_with = "capm")]
        forecasts: Option<PathBuf>,

        /// Estimate expected returns from the panel's history via CAPM
        #[arg(long)]
        capm: bool,

        /// Engine configuration file (JSON); built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Minimum weight per asset
        #[arg(long, default_value = "0.0")]
        lower: f64,

        /// Maximum weight per asset
        #[arg(long, default_value = "1.0")]
        upper: f64,

        /// Investment amount; adds a currency column to the weight table
        #[arg(long)]
        investment: Option<f64>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Solve every risk score 1-10 and tabulate the frontier
    Frontier {
        /// Wide CSV of daily prices (a Date column plus one column per asset)
        #[arg(long)]
        prices: PathBuf,

        /// JSON object of annualized return forecasts per asset
        #[arg(long, conflicts_with = "capm")]
        forecasts: Option<PathBuf>,

        /// Estimate expected returns from the panel's history via CAPM
        #[arg(long)]
        capm: bool,

        /// Engine configuration file (JSON); built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Minimum weight per asset
        #[arg(long, default_value = "0.0")]
        lower: f64,

        /// Maximum weight per asset
        #[arg(long, default_value = "1.0")]
        upper: f64,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize {
            prices,
            risk_score,
            forecasts,
            capm,
            config,
            lower,
            upper,
            investment,
            format,
        } => {
            let panel = input::load_price_panel(&prices)?;
            let config = input::load_config(config.as_deref())?;
            let request = AllocationRequest {
                model: select_model(forecasts.as_deref(), capm)?,
                risk_score,
                bounds: AllocationBounds::new(lower, upper),
            };

            let allocation = allocate(&panel, &request, &config)?;
            if is_json(&format) {
                report::print_allocation_json(&allocation, investment)?;
            } else {
                report::print_allocation_text(&allocation, investment);
            }
        }
        Commands::Frontier {
            prices,
            forecasts,
            capm,
            config,
            lower,
            upper,
            format,
        } => {
            let panel = input::load_price_panel(&prices)?;
            let config = input::load_config(config.as_deref())?;
            let model = select_model(forecasts.as_deref(), capm)?;
            let bounds = AllocationBounds::new(lower, upper);

            let rows = sweep_frontier(&panel, &model, bounds, &config)?;
            if is_json(&format) {
                report::print_frontier_json(&rows)?;
            } else {
                report::print_frontier_text(&rows);
            }
        }
    }

    Ok(())
}

fn select_model(
    forecasts: Option<&Path>,
    capm: bool,
) -> Result<ModelSelector, Box<dyn std::error::Error>> {
    match forecasts {
        Some(path) => Ok(ModelSelector::ForecastTable(input::load_forecasts(path)?)),
        None if capm => Ok(ModelSelector::HistoricalCapm),
        None => Err("choose a return model: --forecasts <FILE> or --capm".into()),
    }
}

fn sweep_frontier(
    panel: &meridian::PricePanel,
    model: &ModelSelector,
    bounds: AllocationBounds,
    config: &EngineConfig,
) -> Result<Vec<(u8, Allocation)>, Box<dyn std::error::Error>> {
    let mut rows = Vec::with_capacity(10);
    for score in 1..=10 {
        let request = AllocationRequest {
            model: model.clone(),
            risk_score: score,
            bounds,
        };
        rows.push((score, allocate(panel, &request, config)?));
    }
    Ok(rows)
}

fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}
