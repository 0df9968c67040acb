#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/meridian-labs/meridian/issues/")]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod estimator;
pub mod shrinkage;

// Re-export main types
pub use estimator::{RiskConfig, RiskEstimate, annualized_covariance, correlation_matrix};
pub use shrinkage::{LedoitWolf, ShrinkageTarget, Shrunk};
