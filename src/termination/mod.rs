//! Termination criteria
//!
//! A run is a small state machine: it stays [`RunState::Running`] until one of
//! the criteria fires at the end of a generation, or the sampler reports a
//! numerical breakdown. Criteria are checked in a fixed order: non-finite
//! best cost, convergence, then the generation budget.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithms::cmaes::config::CmaEsConfig;

/// Why a run stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Best-ever cost stalled or σ collapsed while below the sanity ceiling
    Converged,
    /// Covariance matrix could not be factored
    NumericalBreakdown,
    /// Best-ever cost became NaN or infinite
    NonFiniteObjective,
    /// Iteration budget used up
    BudgetExhausted,
    /// Wall-clock budget used up
    TimeLimit,
}

impl TerminationReason {
    /// True for the numerical failure outcomes
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NumericalBreakdown | Self::NonFiniteObjective)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Converged => "minimized within tolerance",
            Self::NumericalBreakdown => "covariance matrix is not positive-definite",
            Self::NonFiniteObjective => "best cost is not finite",
            Self::BudgetExhausted => "maximum generations reached",
            Self::TimeLimit => "time limit reached",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// State of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Keep iterating
    Running,
    /// Terminal
    Terminated(TerminationReason),
}

impl RunState {
    /// True while the run may take another generation
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The termination reason, if terminal
    pub fn reason(&self) -> Option<TerminationReason> {
        match self {
            Self::Running => None,
            Self::Terminated(reason) => Some(*reason),
        }
    }
}

/// Progress of a run at the end of a generation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSnapshot {
    /// Generations completed (1-based)
    pub generation: usize,
    /// Best-ever cost now
    pub best_cost: f64,
    /// Best-ever cost at the end of the previous generation (+∞ before the first)
    pub previous_best_cost: f64,
    /// Step size after adaptation
    pub sigma: f64,
    /// Cost range of this generation's population
    pub population_spread: f64,
}

/// Termination criterion trait
pub trait TerminationCriterion: Send + Sync {
    /// Check if the run should stop
    fn should_terminate(&self, progress: &ProgressSnapshot) -> bool;

    /// The outcome reported when this criterion fires
    fn reason(&self) -> TerminationReason;
}

/// Stop when the best-ever cost is NaN or infinite
#[derive(Clone, Copy, Debug, Default)]
pub struct NonFiniteBest;

impl TerminationCriterion for NonFiniteBest {
    fn should_terminate(&self, progress: &ProgressSnapshot) -> bool {
        !progress.best_cost.is_finite()
    }

    fn reason(&self) -> TerminationReason {
        TerminationReason::NonFiniteObjective
    }
}

/// Stop when progress stalls or σ collapses, once the cost is plausible
#[derive(Clone, Copy, Debug)]
pub struct ToleranceConvergence {
    /// Best-ever change regarded as a stall
    pub tolerance: f64,
    /// Step size regarded as converged
    pub sigma_tolerance: f64,
    /// Best-ever cost must be below this
    pub sanity_ceiling: f64,
    /// A stall also needs the population's cost spread below `tolerance`
    pub require_flat_population: bool,
}

impl ToleranceConvergence {
    fn stalled(&self, progress: &ProgressSnapshot) -> bool {
        let stalled = (progress.previous_best_cost - progress.best_cost).abs() < self.tolerance;
        if self.require_flat_population {
            stalled && progress.population_spread < self.tolerance
        } else {
            stalled
        }
    }
}

impl TerminationCriterion for ToleranceConvergence {
    fn should_terminate(&self, progress: &ProgressSnapshot) -> bool {
        (self.stalled(progress) || progress.sigma < self.sigma_tolerance)
            && progress.best_cost < self.sanity_ceiling
    }

    fn reason(&self) -> TerminationReason {
        TerminationReason::Converged
    }
}

/// Terminate after a maximum number of generations
#[derive(Clone, Copy, Debug)]
pub struct MaxGenerations(pub usize);

impl TerminationCriterion for MaxGenerations {
    fn should_terminate(&self, progress: &ProgressSnapshot) -> bool {
        progress.generation >= self.0
    }

    fn reason(&self) -> TerminationReason {
        TerminationReason::BudgetExhausted
    }
}

/// The ordered set of criteria checked after every generation
#[derive(Clone, Copy, Debug)]
pub struct TerminationPolicy {
    non_finite: NonFiniteBest,
    convergence: ToleranceConvergence,
    budget: MaxGenerations,
}

impl TerminationPolicy {
    /// Build the policy from a run configuration
    pub fn from_config(config: &CmaEsConfig) -> Self {
        Self {
            non_finite: NonFiniteBest,
            convergence: ToleranceConvergence {
                tolerance: config.tolerance,
                sigma_tolerance: config.sigma_tolerance,
                sanity_ceiling: config.sanity_ceiling,
                require_flat_population: config.require_flat_population,
            },
            budget: MaxGenerations(config.max_generations),
        }
    }

    /// Decide the run state after a generation
    pub fn check(&self, progress: &ProgressSnapshot) -> RunState {
        let criteria: [&dyn TerminationCriterion; 3] =
            [&self.non_finite, &self.convergence, &self.budget];

        criteria
            .iter()
            .find(|c| c.should_terminate(progress))
            .map_or(RunState::Running, |c| RunState::Terminated(c.reason()))
    }
}

pub mod prelude {
    pub use super::{
        MaxGenerations, NonFiniteBest, ProgressSnapshot, RunState, TerminationCriterion,
        TerminationPolicy, TerminationReason, ToleranceConvergence,
    };
}
