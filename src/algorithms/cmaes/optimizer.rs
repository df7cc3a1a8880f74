//! The CMA-ES generation loop

use std::time::Instant;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::algorithms::cmaes::adaptation::adapt;
use crate::algorithms::cmaes::config::{CmaEsConfig, CovarianceRepair};
use crate::algorithms::cmaes::params::StrategyParams;
use crate::algorithms::cmaes::recombination::{rank_by_cost, weighted_step, CostSummary};
use crate::algorithms::cmaes::sampler::{CovarianceRoot, Population};
use crate::algorithms::cmaes::state::{DistributionState, DoubleBuffer};
use crate::diagnostics::{GenerationStats, TimingStats};
use crate::encoding::codec::{Codec, IdentityCodec};
use crate::error::{ensure_dimension, EvoResult, EvolutionError};
use crate::fitness::benchmarks::ObjectiveKind;
use crate::fitness::traits::Evaluator;
use crate::termination::{ProgressSnapshot, RunState, TerminationPolicy, TerminationReason};

/// Outcome of a finished run
///
/// Failure outcomes still carry the best-ever point, so partial progress is
/// never lost.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CmaEsResult {
    /// Best-ever cost (non-finite for [`TerminationReason::NonFiniteObjective`])
    pub best_cost: f64,
    /// Flat vector that achieved the best-ever cost
    pub best_solution: Vec<f64>,
    /// Why the run stopped
    pub reason: TerminationReason,
    /// Completed generations
    pub generations: usize,
    /// Objective evaluations, including the initial point
    pub evaluations: usize,
    /// Step size when the run stopped
    pub final_sigma: f64,
    /// Per-generation statistics, when history recording is enabled
    pub history: Vec<GenerationStats>,
}

impl CmaEsResult {
    /// True unless the run ended in a numerical failure
    pub fn is_success(&self) -> bool {
        !self.reason.is_failure()
    }

    /// Decode the best-ever point into its domain representation
    pub fn decode<C: Codec>(&self, codec: &C) -> C::Decoded {
        codec.decode(&self.best_solution)
    }
}

/// CMA-ES optimizer owning all numeric state of one run
#[derive(Clone, Debug)]
pub struct CmaEs {
    config: CmaEsConfig,
    params: StrategyParams,
    policy: TerminationPolicy,
    buffers: DoubleBuffer<DistributionState>,
    generation: usize,
    evaluations: usize,
    best_cost: f64,
    best_solution: DVector<f64>,
    previous_best_cost: f64,
    initialized: bool,
    state: RunState,
    last_stats: Option<GenerationStats>,
    history: Vec<GenerationStats>,
}

impl CmaEs {
    /// Set up a run starting at `initial_mean`
    pub fn new(initial_mean: Vec<f64>, config: CmaEsConfig) -> EvoResult<Self> {
        config.validate()?;
        if initial_mean.is_empty() {
            return Err(EvolutionError::EmptyDimension);
        }
        if initial_mean.iter().any(|v| !v.is_finite()) {
            return Err(EvolutionError::Configuration(
                "initial mean must be finite".to_string(),
            ));
        }

        let params = StrategyParams::new(initial_mean.len(), &config)?;
        let policy = TerminationPolicy::from_config(&config);
        let mean = DVector::from_vec(initial_mean);
        let buffers = DoubleBuffer::new(DistributionState::initial(mean.clone(), config.initial_sigma));

        debug!(
            dimension = params.dimension,
            lambda = params.lambda,
            mu = params.mu,
            mu_eff = params.mu_eff,
            sigma = config.initial_sigma,
            "CMA-ES initialized"
        );

        Ok(Self {
            config,
            params,
            policy,
            buffers,
            generation: 0,
            evaluations: 0,
            best_cost: f64::INFINITY,
            best_solution: mean,
            previous_best_cost: f64::INFINITY,
            initialized: false,
            state: RunState::Running,
            last_stats: None,
            history: Vec::new(),
        })
    }

    /// Run one generation: sample, evaluate, rank, recombine, adapt, check termination
    ///
    /// The starting point is evaluated on the first call. Once the run has
    /// terminated, further calls do nothing and return the terminal state.
    pub fn step<C, E, R>(&mut self, codec: &C, evaluator: &E, rng: &mut R) -> EvoResult<RunState>
    where
        C: Codec,
        E: Evaluator<C::Decoded> + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.state.is_running() {
            return Ok(self.state);
        }
        if let Some(expected) = codec.dimension() {
            ensure_dimension(expected, self.params.dimension)?;
        }
        self.ensure_initialized(codec, evaluator);

        let started = Instant::now();
        let generation = self.generation + 1;

        let root = match CovarianceRoot::factor(&self.buffers.previous().covariance) {
            Some(root) => root,
            None => return Ok(self.finish(TerminationReason::NumericalBreakdown)),
        };

        let previous = self.buffers.previous();
        let population = Population::sample(
            &root,
            &previous.mean,
            previous.sigma,
            self.params.lambda,
            rng,
        );

        let evaluation_started = Instant::now();
        let costs = evaluate_population(codec, evaluator, &population.candidates);
        let evaluation_time = evaluation_started.elapsed();

        let ranking = rank_by_cost(&costs);
        let step = weighted_step(&population.offsets, &ranking, &self.params.weights);

        let adaptation_started = Instant::now();
        let params = &self.params;
        let (previous, next) = self.buffers.split();

        next.mean = &previous.mean + &step * previous.sigma;
        let mean_cost = evaluator.evaluate(&codec.decode(next.mean.as_slice()));
        self.evaluations += costs.len() + 1;

        if mean_cost < self.best_cost {
            self.best_cost = mean_cost;
            self.best_solution.copy_from(&next.mean);
        }

        let selected = ranking
            .iter()
            .zip(&params.weights)
            .map(|(&idx, &w)| (w, &population.offsets[idx]));

        let report = match adapt(params, generation, previous, next, &root, &step, selected) {
            Some(report) => report,
            None => return Ok(self.finish(TerminationReason::NumericalBreakdown)),
        };
        let adaptation_time = adaptation_started.elapsed();

        self.buffers.swap();
        self.generation = generation;

        if report.repaired {
            warn!(
                generation,
                mode = ?self.params.covariance_repair,
                "covariance had negative eigenvalues; repaired"
            );
        }

        let summary = CostSummary::from_ranking(&costs, &ranking);
        let stats = GenerationStats {
            generation,
            evaluations: self.evaluations,
            best_cost: self.best_cost,
            mean_cost,
            population_best: summary.map_or(f64::NAN, |s| s.best),
            population_worst: summary.map_or(f64::NAN, |s| s.worst),
            population_median: summary.map_or(f64::NAN, |s| s.median),
            sigma: self.buffers.previous().sigma,
            h_sigma: report.h_sigma,
            covariance_repaired: report.repaired,
            timing: TimingStats::new()
                .with_evaluation(evaluation_time)
                .with_adaptation(adaptation_time)
                .with_total(started.elapsed()),
        };

        debug!(
            generation,
            best_cost = stats.best_cost,
            mean_cost,
            sigma = stats.sigma,
            h_sigma = report.h_sigma,
            repaired = report.repaired,
            "CMA-ES generation"
        );

        let progress = ProgressSnapshot {
            generation,
            best_cost: self.best_cost,
            previous_best_cost: self.previous_best_cost,
            sigma: stats.sigma,
            population_spread: stats.population_spread(),
        };

        if self.config.record_history {
            self.history.push(stats.clone());
        }
        self.last_stats = Some(stats);
        self.previous_best_cost = self.best_cost;

        Ok(match self.policy.check(&progress) {
            RunState::Running => RunState::Running,
            RunState::Terminated(reason) => self.finish(reason),
        })
    }

    /// Run generations until a termination criterion fires
    pub fn run<C, E, R>(&mut self, codec: &C, evaluator: &E, rng: &mut R) -> EvoResult<CmaEsResult>
    where
        C: Codec,
        E: Evaluator<C::Decoded> + ?Sized,
        R: Rng + ?Sized,
    {
        let started = Instant::now();
        loop {
            match self.step(codec, evaluator, rng)? {
                RunState::Running => {
                    if let Some(limit) = self.config.time_limit {
                        if started.elapsed() >= limit {
                            self.finish(TerminationReason::TimeLimit);
                        }
                    }
                }
                RunState::Terminated(reason) => return Ok(self.build_result(reason)),
            }
        }
    }

    /// Run on flat vectors, with the evaluator seeing the search vector itself
    pub fn minimize<E, R>(&mut self, evaluator: &E, rng: &mut R) -> EvoResult<CmaEsResult>
    where
        E: Evaluator<Vec<f64>> + ?Sized,
        R: Rng + ?Sized,
    {
        self.run(&IdentityCodec, evaluator, rng)
    }

    /// The outcome, once the run has terminated
    pub fn result(&self) -> Option<CmaEsResult> {
        self.state.reason().map(|reason| self.build_result(reason))
    }

    fn ensure_initialized<C, E>(&mut self, codec: &C, evaluator: &E)
    where
        C: Codec,
        E: Evaluator<C::Decoded> + ?Sized,
    {
        if self.initialized {
            return;
        }
        self.best_cost = evaluator.evaluate(&codec.decode(self.best_solution.as_slice()));
        self.evaluations = 1;
        self.initialized = true;
        debug!(initial_cost = self.best_cost, "CMA-ES evaluated starting point");
    }

    fn finish(&mut self, reason: TerminationReason) -> RunState {
        self.state = RunState::Terminated(reason);
        if reason.is_failure() {
            warn!(
                generation = self.generation,
                best_cost = self.best_cost,
                "CMA-ES terminating with failure: {}",
                reason
            );
        } else {
            info!(
                generation = self.generation,
                evaluations = self.evaluations,
                best_cost = self.best_cost,
                "CMA-ES terminated: {}",
                reason
            );
        }
        self.state
    }

    fn build_result(&self, reason: TerminationReason) -> CmaEsResult {
        CmaEsResult {
            best_cost: self.best_cost,
            best_solution: self.best_solution.as_slice().to_vec(),
            reason,
            generations: self.generation,
            evaluations: self.evaluations,
            final_sigma: self.sigma(),
            history: self.history.clone(),
        }
    }

    /// Get the current generation
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Get total evaluations
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Get current mean
    pub fn mean(&self) -> &[f64] {
        self.buffers.previous().mean.as_slice()
    }

    /// Get current sigma
    pub fn sigma(&self) -> f64 {
        self.buffers.previous().sigma
    }

    /// Get the current covariance matrix
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.buffers.previous().covariance
    }

    /// Get the full current distribution
    pub fn distribution(&self) -> &DistributionState {
        self.buffers.previous()
    }

    /// Get the best solution found
    pub fn best_solution(&self) -> &[f64] {
        self.best_solution.as_slice()
    }

    /// Get the best cost found
    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    /// Strategy parameters of this run
    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Configuration of this run
    pub fn config(&self) -> &CmaEsConfig {
        &self.config
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Statistics of the most recent generation
    pub fn last_stats(&self) -> Option<&GenerationStats> {
        self.last_stats.as_ref()
    }
}

/// Evaluate every candidate, keeping population index order
#[cfg(feature = "parallel")]
fn evaluate_population<C, E>(codec: &C, evaluator: &E, candidates: &[DVector<f64>]) -> Vec<f64>
where
    C: Codec,
    E: Evaluator<C::Decoded> + ?Sized,
{
    use rayon::prelude::*;

    candidates
        .par_iter()
        .map(|x| evaluator.evaluate(&codec.decode(x.as_slice())))
        .collect()
}

/// Evaluate every candidate, keeping population index order
#[cfg(not(feature = "parallel"))]
fn evaluate_population<C, E>(codec: &C, evaluator: &E, candidates: &[DVector<f64>]) -> Vec<f64>
where
    C: Codec,
    E: Evaluator<C::Decoded> + ?Sized,
{
    candidates
        .iter()
        .map(|x| evaluator.evaluate(&codec.decode(x.as_slice())))
        .collect()
}

/// Builder for CMA-ES
pub struct CmaEsBuilder {
    initial_mean: Option<Vec<f64>>,
    config: CmaEsConfig,
}

impl CmaEsBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            initial_mean: None,
            config: CmaEsConfig::default(),
        }
    }

    /// Set the initial mean
    pub fn mean(mut self, mean: Vec<f64>) -> Self {
        self.initial_mean = Some(mean);
        self
    }

    /// Set the initial mean from a domain value through a codec
    pub fn encoded_mean<C: Codec>(mut self, codec: &C, decoded: &C::Decoded) -> EvoResult<Self> {
        self.initial_mean = Some(codec.encode(decoded)?);
        Ok(self)
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: CmaEsConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the initial step size (sigma)
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.config.initial_sigma = sigma;
        self
    }

    /// Set the population size explicitly
    pub fn lambda(mut self, lambda: usize) -> Self {
        self.config.lambda = Some(lambda);
        self
    }

    /// Set the population multiplier K
    pub fn population_multiplier(mut self, multiplier: f64) -> Self {
        self.config.population_multiplier = multiplier;
        self
    }

    /// Set the exponent on the step-size update factor
    pub fn sigma_damping_exponent(mut self, exponent: f64) -> Self {
        self.config.sigma_damping_exponent = exponent;
        self
    }

    /// Set the iteration budget
    pub fn max_generations(mut self, max_generations: usize) -> Self {
        self.config.max_generations = max_generations;
        self
    }

    /// Set the best-ever change tolerance
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set the step-size tolerance
    pub fn sigma_tolerance(mut self, sigma_tolerance: f64) -> Self {
        self.config.sigma_tolerance = sigma_tolerance;
        self
    }

    /// Set the ceiling below which convergence may be declared
    pub fn sanity_ceiling(mut self, ceiling: f64) -> Self {
        self.config.sanity_ceiling = ceiling;
        self
    }

    /// Require a flat population before a stall counts as convergence
    pub fn require_flat_population(mut self, require: bool) -> Self {
        self.config.require_flat_population = require;
        self
    }

    /// Choose how negative covariance eigenvalues are handled
    pub fn covariance_repair(mut self, mode: CovarianceRepair) -> Self {
        self.config.covariance_repair = mode;
        self
    }

    /// Set a wall-clock budget
    pub fn time_limit(mut self, limit: std::time::Duration) -> Self {
        self.config.time_limit = Some(limit);
        self
    }

    /// Keep per-generation statistics in the result
    pub fn record_history(mut self, record: bool) -> Self {
        self.config.record_history = record;
        self
    }

    /// Build the CMA-ES optimizer
    pub fn build(self) -> EvoResult<CmaEs> {
        let mean = self
            .initial_mean
            .ok_or_else(|| EvolutionError::Configuration("Initial mean not set".to_string()))?;
        CmaEs::new(mean, self.config)
    }
}

impl Default for CmaEsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimize a built-in objective from `initial` with the default configuration
pub fn optimize<R: Rng + ?Sized>(
    initial: &[f64],
    dimension: usize,
    objective: ObjectiveKind,
    rng: &mut R,
) -> EvoResult<CmaEsResult> {
    optimize_with_config(initial, dimension, objective, CmaEsConfig::default(), rng)
}

/// Minimize a built-in objective from `initial` with an explicit configuration
pub fn optimize_with_config<R: Rng + ?Sized>(
    initial: &[f64],
    dimension: usize,
    objective: ObjectiveKind,
    config: CmaEsConfig,
    rng: &mut R,
) -> EvoResult<CmaEsResult> {
    ensure_dimension(dimension, initial.len())?;
    let mut cmaes = CmaEs::new(initial.to_vec(), config)?;
    cmaes.minimize(&objective, rng)
}


#[cfg(all(test, feature = "parallel"))]
mod parallel_tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // Integer plateaus produce many tied costs
    fn plateau(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v.abs().floor()).sum()
    }

    #[test]
    fn test_parallel_costs_match_sequential_order() {
        let mut rng = StdRng::seed_from_u64(21);
        let root = CovarianceRoot::factor(&DMatrix::identity(4, 4)).unwrap();
        let mean = DVector::from_vec(vec![0.5; 4]);
        let population = Population::sample(&root, &mean, 2.0, 256, &mut rng);

        let parallel = evaluate_population(&IdentityCodec, &plateau, &population.candidates);
        let sequential: Vec<f64> = population
            .candidates
            .iter()
            .map(|x| plateau(&x.as_slice().to_vec()))
            .collect();

        assert_eq!(parallel, sequential);
        assert_eq!(rank_by_cost(&parallel), rank_by_cost(&sequential));
    }

    #[test]
    fn test_parallel_runs_are_bit_identical() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(33);
            let mut cmaes = CmaEsBuilder::new()
                .mean(vec![3.0, -2.0, 4.0])
                .max_generations(30)
                .record_history(true)
                .build()
                .unwrap();
            cmaes.minimize(&plateau, &mut rng).unwrap()
        };

        let first = run();
        let second = run();

        assert_eq!(first.best_solution, second.best_solution);
        assert_eq!(first.best_cost.to_bits(), second.best_cost.to_bits());
        assert_eq!(first.final_sigma.to_bits(), second.final_sigma.to_bits());
        assert_eq!(first.history.len(), second.history.len());
        for (a, b) in first.history.iter().zip(&second.history) {
            assert_eq!(a.mean_cost.to_bits(), b.mean_cost.to_bits());
            assert_eq!(a.population_median.to_bits(), b.population_median.to_bits());
            assert_eq!(a.sigma.to_bits(), b.sigma.to_bits());
        }
    }
}
