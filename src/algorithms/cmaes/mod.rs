//! Covariance Matrix Adaptation Evolution Strategy (CMA-ES)
//!
//! A derandomized evolution strategy for continuous minimization. Each
//! generation samples a population from a multivariate normal distribution,
//! ranks it by cost, recombines the best half into a new mean and adapts the
//! step size and covariance from the selected steps.
//!
//! The run keeps two distribution slots: the one the current population is
//! sampled from and the one being written for the next generation. They are
//! swapped once adaptation succeeds, so a numerical failure never leaves a
//! half-updated distribution behind.

pub mod adaptation;
pub mod config;
pub mod optimizer;
pub mod params;
pub mod recombination;
pub mod sampler;
pub mod state;

pub use config::{CmaEsConfig, CovarianceRepair};
pub use optimizer::{optimize, optimize_with_config, CmaEs, CmaEsBuilder, CmaEsResult};
pub use params::StrategyParams;
pub use state::DistributionState;
