//! Optimization algorithms

pub mod cmaes;

pub mod prelude {
    pub use super::cmaes::{
        optimize, optimize_with_config, CmaEs, CmaEsBuilder, CmaEsConfig, CmaEsResult, CovarianceRepair,
        DistributionState, StrategyParams,
    };
}
