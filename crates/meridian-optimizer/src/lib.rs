#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/meridian-labs/meridian/issues/")]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod optimizer;
pub mod performance;
mod qp;
pub mod risk_target;

// Re-export main types
pub use optimizer::{OptimizedPortfolio, OptimizerConfig, OptimizerError, optimize};
pub use performance::{Performance, evaluate};
pub use risk_target::{RiskTargetRange, target_volatility};
