//! Strategy parameters derived once per run from n and λ

use crate::algorithms::cmaes::config::{CmaEsConfig, CovarianceRepair};
use crate::error::{EvoResult, EvolutionError};

/// Population size λ = round((4 + 3 ln n) · K)
pub fn population_size(dimension: usize, multiplier: f64) -> usize {
    ((4.0 + 3.0 * (dimension as f64).ln()) * multiplier).round() as usize
}

/// Log-linear recombination weights wⱼ = ln(μ + 0.5) − ln(j + 1), normalized
pub fn recombination_weights(mu: usize) -> Vec<f64> {
    let mut weights: Vec<f64> = (0..mu)
        .map(|j| (mu as f64 + 0.5).ln() - ((j + 1) as f64).ln())
        .collect();

    let weight_sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= weight_sum;
    }
    weights
}

/// Constant strategy parameters of one run
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyParams {
    /// Problem dimension (n)
    pub dimension: usize,
    /// Population size (λ)
    pub lambda: usize,
    /// Parent number (μ)
    pub mu: usize,
    /// Recombination weights
    pub weights: Vec<f64>,
    /// Variance effective selection mass (μ_eff)
    pub mu_eff: f64,
    /// Learning rate for cumulation for σ control
    pub c_sigma: f64,
    /// Damping for σ
    pub d_sigma: f64,
    /// Learning rate for cumulation for C
    pub c_c: f64,
    /// Learning rate for rank-1 update
    pub c_1: f64,
    /// Learning rate for rank-μ update
    pub c_mu: f64,
    /// Expected length of a N(0, I) random vector
    pub chi_n: f64,
    /// Threshold of the heaviside gate on ‖p_σ‖
    pub h_threshold: f64,
    /// Exponent applied to the step-size update factor
    pub sigma_damping_exponent: f64,
    /// Handling of negative eigenvalues after adaptation
    pub covariance_repair: CovarianceRepair,
}

impl StrategyParams {
    /// Derive all parameters for a problem of the given dimension
    pub fn new(dimension: usize, config: &CmaEsConfig) -> EvoResult<Self> {
        if dimension == 0 {
            return Err(EvolutionError::EmptyDimension);
        }

        let lambda = config
            .lambda
            .unwrap_or_else(|| population_size(dimension, config.population_multiplier));
        if lambda < 2 {
            return Err(EvolutionError::Configuration(format!(
                "population size must be at least 2, got {}",
                lambda
            )));
        }

        let mu = ((lambda as f64) / 2.0).round() as usize;
        let weights = recombination_weights(mu);
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let n = dimension as f64;

        let c_sigma = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        let d_sigma = 1.0 + c_sigma + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0);

        let chi_n = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n));

        let c_c = (4.0 + mu_eff / n) / (4.0 + n + 2.0 * mu_eff / n);
        let h_threshold = (1.4 + 2.0 / (n + 1.0)) * chi_n;

        let c_1 = 2.0 / ((n + 1.3).powi(2) + mu_eff);
        let c_mu = (1.0 - c_1).min(2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + mu_eff));

        Ok(Self {
            dimension,
            lambda,
            mu,
            weights,
            mu_eff,
            c_sigma,
            d_sigma,
            c_c,
            c_1,
            c_mu,
            chi_n,
            h_threshold,
            sigma_damping_exponent: config.sigma_damping_exponent,
            covariance_repair: config.covariance_repair,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_population_size_closed_form() {
        // (4 + 3 ln 10) * 11 = 119.985...
        assert_eq!(population_size(10, 11.0), 120);
        assert_eq!(population_size(5, 11.0), 97);
        assert_eq!(population_size(1, 11.0), 44);
        assert_eq!(population_size(10, 10.0), 109);
    }

    #[test]
    fn test_params_for_dimension_ten() {
        let params = StrategyParams::new(10, &CmaEsConfig::default()).unwrap();
        let expected_lambda = ((4.0 + 3.0 * 10f64.ln()) * 11.0).round() as usize;
        assert_eq!(params.lambda, expected_lambda);
        assert_eq!(params.mu, ((expected_lambda as f64) / 2.0).round() as usize);
        assert_eq!(params.mu, 60);
        assert_eq!(params.weights.len(), params.mu);
    }

    #[test]
    fn test_odd_lambda_rounds_mu_up() {
        let params = StrategyParams::new(5, &CmaEsConfig::default()).unwrap();
        assert_eq!(params.lambda, 97);
        assert_eq!(params.mu, 49);
    }

    #[test]
    fn test_weights_sum_to_one_and_decrease() {
        let weights = recombination_weights(7);
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(weights.windows(2).all(|w| w[0] > w[1]));
        assert!(weights.iter().all(|&w| w > 0.0));
    }

    #[test]
    fn test_learning_rates_are_bounded() {
        let params = StrategyParams::new(20, &CmaEsConfig::default()).unwrap();
        assert!(params.c_1 > 0.0 && params.c_mu >= 0.0);
        assert!(params.c_1 + params.c_mu <= 1.0);
        assert!(params.c_sigma > 0.0 && params.c_sigma < 1.0);
        assert!(params.c_c > 0.0 && params.c_c <= 1.0);
        assert!(params.d_sigma >= 1.0);
        assert_relative_eq!(
            params.mu_eff,
            1.0 / params.weights.iter().map(|w| w * w).sum::<f64>()
        );
    }

    #[test]
    fn test_expected_norm() {
        let params = StrategyParams::new(4, &CmaEsConfig::default()).unwrap();
        let expected = 2.0 * (1.0 - 1.0 / 16.0 + 1.0 / (21.0 * 16.0));
        assert_relative_eq!(params.chi_n, expected, epsilon = 1e-12);
        assert_relative_eq!(params.h_threshold, (1.4 + 2.0 / 5.0) * expected, epsilon = 1e-12);
    }

    #[test]
    fn test_lambda_override() {
        let config = CmaEsConfig {
            lambda: Some(2),
            ..Default::default()
        };
        let params = StrategyParams::new(3, &config).unwrap();
        assert_eq!(params.lambda, 2);
        assert_eq!(params.mu, 1);
        assert_eq!(params.weights, vec![1.0]);
        assert_relative_eq!(params.mu_eff, 1.0);
        assert_eq!(params.c_mu, 0.0);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(
            StrategyParams::new(0, &CmaEsConfig::default()),
            Err(EvolutionError::EmptyDimension)
        );
    }
}
