//! Run configuration for CMA-ES

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};

/// Default initial step size
pub const DEFAULT_INITIAL_SIGMA: f64 = 1.5;

/// Default multiplier applied to `4 + 3 ln(n)` when sizing the population
pub const DEFAULT_POPULATION_MULTIPLIER: f64 = 11.0;

/// Default exponent applied to the step-size update factor
pub const DEFAULT_SIGMA_DAMPING_EXPONENT: f64 = 0.3;

/// Default iteration budget
pub const DEFAULT_MAX_GENERATIONS: usize = 500;

/// Default tolerance on best-ever cost change
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Default tolerance on the step size
pub const DEFAULT_SIGMA_TOLERANCE: f64 = 1e-6;

/// Default ceiling below which convergence may be declared
pub const DEFAULT_SANITY_CEILING: f64 = 100.0;

/// What to do when the adapted covariance picks up a negative eigenvalue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceRepair {
    /// Zero the whole matrix; the next factorization fails and the run ends
    /// with a numerical breakdown
    #[default]
    Reset,
    /// Rebuild the matrix from its non-negative eigenpairs and keep going
    ClipNegative,
}

/// Tunables for one optimization run
///
/// The defaults deliberately differ from textbook CMA-ES in two places: the
/// population multiplier is 11 (textbook 10) and the step-size update factor
/// is raised to the power 0.3 (textbook 1.0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmaEsConfig {
    /// Initial step size (σ₀)
    pub initial_sigma: f64,
    /// K in λ = round((4 + 3 ln n) · K)
    pub population_multiplier: f64,
    /// Explicit population size, overriding the multiplier formula
    pub lambda: Option<usize>,
    /// Exponent on the step-size update factor
    pub sigma_damping_exponent: f64,
    /// Iteration budget
    pub max_generations: usize,
    /// Best-ever cost change regarded as a stall
    pub tolerance: f64,
    /// Step size regarded as converged
    pub sigma_tolerance: f64,
    /// Convergence is only declared while the best-ever cost is below this
    pub sanity_ceiling: f64,
    /// A stall only counts once the generation's cost spread is also below `tolerance`
    ///
    /// On by default, which is stricter than a bare stall rule: with the bare
    /// rule a single unchanged best-ever cost is enough to stop, and sphere
    /// runs routinely stop far from the optimum after a handful of
    /// generations. Set to `false` for the bare rule.
    pub require_flat_population: bool,
    /// Handling of negative eigenvalues in the adapted covariance
    pub covariance_repair: CovarianceRepair,
    /// Wall-clock budget, checked between generations
    pub time_limit: Option<Duration>,
    /// Keep per-generation statistics in the result
    pub record_history: bool,
}

impl Default for CmaEsConfig {
    fn default() -> Self {
        Self {
            initial_sigma: DEFAULT_INITIAL_SIGMA,
            population_multiplier: DEFAULT_POPULATION_MULTIPLIER,
            lambda: None,
            sigma_damping_exponent: DEFAULT_SIGMA_DAMPING_EXPONENT,
            max_generations: DEFAULT_MAX_GENERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            sigma_tolerance: DEFAULT_SIGMA_TOLERANCE,
            sanity_ceiling: DEFAULT_SANITY_CEILING,
            require_flat_population: true,
            covariance_repair: CovarianceRepair::Reset,
            time_limit: None,
            record_history: false,
        }
    }
}

impl CmaEsConfig {
    /// Textbook settings: multiplier 10, undamped step-size update
    pub fn textbook() -> Self {
        Self {
            population_multiplier: 10.0,
            sigma_damping_exponent: 1.0,
            ..Self::default()
        }
    }

    /// Check every tunable for a usable value
    pub fn validate(&self) -> EvoResult<()> {
        fn positive(name: &str, value: f64) -> EvoResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(EvolutionError::Configuration(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )))
            }
        }

        positive("initial_sigma", self.initial_sigma)?;
        positive("population_multiplier", self.population_multiplier)?;
        positive("sigma_damping_exponent", self.sigma_damping_exponent)?;
        positive("tolerance", self.tolerance)?;
        positive("sigma_tolerance", self.sigma_tolerance)?;

        if self.sanity_ceiling.is_nan() {
            return Err(EvolutionError::Configuration(
                "sanity_ceiling must not be NaN".to_string(),
            ));
        }
        if self.max_generations == 0 {
            return Err(EvolutionError::Configuration(
                "max_generations must be at least 1".to_string(),
            ));
        }
        if let Some(lambda) = self.lambda {
            if lambda < 2 {
                return Err(EvolutionError::Configuration(format!(
                    "lambda must be at least 2, got {}",
                    lambda
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CmaEsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_multiplier, 11.0);
        assert_eq!(config.sigma_damping_exponent, 0.3);
        assert_eq!(config.initial_sigma, 1.5);
        assert_eq!(config.max_generations, 500);
        assert!(config.require_flat_population);
        assert_eq!(config.covariance_repair, CovarianceRepair::Reset);
    }

    #[test]
    fn test_textbook_config() {
        let config = CmaEsConfig::textbook();
        assert_eq!(config.population_multiplier, 10.0);
        assert_eq!(config.sigma_damping_exponent, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            CmaEsConfig {
                initial_sigma: 0.0,
                ..Default::default()
            },
            CmaEsConfig {
                initial_sigma: f64::NAN,
                ..Default::default()
            },
            CmaEsConfig {
                lambda: Some(1),
                ..Default::default()
            },
            CmaEsConfig {
                max_generations: 0,
                ..Default::default()
            },
            CmaEsConfig {
                sigma_damping_exponent: -0.3,
                ..Default::default()
            },
            CmaEsConfig {
                tolerance: f64::INFINITY,
                ..Default::default()
            },
        ];

        for config in &bad {
            assert!(
                matches!(config.validate(), Err(EvolutionError::Configuration(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_config_serde_fills_defaults() {
        let config: CmaEsConfig =
            serde_json::from_str(r#"{"initial_sigma": 0.5, "lambda": 12}"#).unwrap();
        assert_eq!(config.initial_sigma, 0.5);
        assert_eq!(config.lambda, Some(12));
        assert_eq!(config.max_generations, DEFAULT_MAX_GENERATIONS);
        assert_eq!(config.covariance_repair, CovarianceRepair::Reset);

        let clip: CmaEsConfig =
            serde_json::from_str(r#"{"covariance_repair": "clip_negative"}"#).unwrap();
        assert_eq!(clip.covariance_repair, CovarianceRepair::ClipNegative);

        let json = serde_json::to_string(&config).unwrap();
        let back: CmaEsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
