//! Impact scoring and equitable donation distribution for verified
//! healthcare workers.
//!
//! Everything here is a pure function of its inputs: configuration is loaded
//! once by the caller and passed in explicitly.

pub mod allocation;
pub mod config;
pub mod distribution;
pub mod error;
pub mod logging;
pub mod plan;
pub mod registry;
pub mod report;
pub mod scoring;
pub mod types;

pub use distribution::{distribute, distribute_scores, DistributionOutcome};
pub use error::{FlamebornError, Result};
pub use plan::plan_distribution;
pub use scoring::score_worker;
