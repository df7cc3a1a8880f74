//! Diagnostics and statistics
//!
//! Per-generation records of an optimization run. The optimizer emits one
//! [`GenerationStats`] per completed generation and logs it at debug level;
//! the full history is kept in the result when requested.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Statistics for a single generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number (1-based)
    pub generation: usize,
    /// Total objective evaluations so far
    pub evaluations: usize,
    /// Best-ever cost after this generation
    pub best_cost: f64,
    /// Cost of the recombined mean
    pub mean_cost: f64,
    /// Lowest cost in the population
    pub population_best: f64,
    /// Highest cost in the population
    pub population_worst: f64,
    /// Median cost in the population
    pub population_median: f64,
    /// Step size after adaptation
    pub sigma: f64,
    /// Whether the heaviside gate let the step into p_c
    pub h_sigma: bool,
    /// Whether the covariance needed eigen repair
    pub covariance_repaired: bool,
    /// Timing information
    pub timing: TimingStats,
}

impl GenerationStats {
    /// Width of the population's cost range; NaN if any cost was NaN
    pub fn population_spread(&self) -> f64 {
        self.population_worst - self.population_best
    }
}

/// Timing statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    /// Time spent on objective evaluation (ms)
    pub evaluation_ms: f64,
    /// Time spent on adaptation and repair (ms)
    pub adaptation_ms: f64,
    /// Total generation time (ms)
    pub total_ms: f64,
}

impl TimingStats {
    /// Create new timing stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Set evaluation time
    pub fn with_evaluation(mut self, duration: Duration) -> Self {
        self.evaluation_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set adaptation time
    pub fn with_adaptation(mut self, duration: Duration) -> Self {
        self.adaptation_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set total time
    pub fn with_total(mut self, duration: Duration) -> Self {
        self.total_ms = duration.as_secs_f64() * 1000.0;
        self
    }
}

pub mod prelude {
    pub use super::{GenerationStats, TimingStats};
}
