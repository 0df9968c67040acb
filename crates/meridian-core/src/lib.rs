#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/meridian-labs/meridian/issues/")]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bounds;
pub mod diag;
pub mod linalg;
pub mod panel;

// Re-export main types
pub use bounds::{AllocationBounds, BoundsError};
pub use diag::{Degeneracy, Diagnostics};
pub use panel::{PanelError, PricePanel, PricePanelBuilder};
