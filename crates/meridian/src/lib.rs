#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/meridian-labs/meridian/issues/")]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod allocate;
pub mod config;

// Re-export the public surface of the engine
pub use allocate::{Allocation, AllocationRequest, ModelSelector, allocate};
pub use config::EngineConfig;

pub use meridian_core::bounds::{AllocationBounds, BoundsError};
pub use meridian_core::diag::{Degeneracy, Diagnostics};
pub use meridian_core::panel::{PanelError, PricePanel, PricePanelBuilder};
pub use meridian_optimizer::{OptimizerError, Performance, RiskTargetRange};
pub use meridian_returns::ForecastTable;
pub use meridian_risk::ShrinkageTarget;
pub use meridian_risk::estimator::correlation_matrix;
