//! Step-size control and covariance adaptation
//!
//! Order of one adaptation pass, all reading the previous slot:
//!
//! 1. p_σ ← (1−c_σ)·p_σ + √(c_σ(2−c_σ)μ_eff) · L⁻¹·y_w
//! 2. σ ← σ · [exp((c_σ/d_σ)(‖p_σ‖/E‖N(0,I)‖ − 1))]^e
//! 3. heaviside gate h_σ on ‖p_σ‖, then p_c and the rank-one term
//! 4. rank-μ term from the best μ offsets
//! 5. repair if C picked up negative eigenvalues (reset to zero by default)

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::algorithms::cmaes::config::CovarianceRepair;
use crate::algorithms::cmaes::params::StrategyParams;
use crate::algorithms::cmaes::sampler::CovarianceRoot;
use crate::algorithms::cmaes::state::DistributionState;

const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// What one adaptation pass decided
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptationReport {
    /// Whether the heaviside gate let the step into p_c
    pub h_sigma: bool,
    /// ‖p_σ‖ after the update
    pub path_sigma_norm: f64,
    /// Whether negative eigenvalues had to be removed from C
    pub repaired: bool,
}

/// Multiplicative step-size update, damped by the configured exponent
pub fn update_step_size(sigma: f64, path_sigma_norm: f64, params: &StrategyParams) -> f64 {
    let factor = ((params.c_sigma / params.d_sigma) * (path_sigma_norm / params.chi_n - 1.0)).exp();
    sigma * factor.powf(params.sigma_damping_exponent)
}

/// Heaviside gate: true while ‖p_σ‖ is within its expected range
pub fn heaviside(path_sigma_norm: f64, generation: usize, params: &StrategyParams) -> bool {
    let correction = (1.0 - (1.0 - params.c_sigma).powf(2.0 * generation as f64)).sqrt();
    path_sigma_norm / correction < params.h_threshold
}

/// Deal with negative eigenvalues of a symmetric matrix
///
/// With [`CovarianceRepair::Reset`] any negative eigenvalue zeroes the whole
/// matrix. With [`CovarianceRepair::ClipNegative`] the matrix is rebuilt from
/// its non-negative eigenpairs. Returns `Some(true)` when the matrix was
/// changed, `Some(false)` when it was already PSD, and `None` when it holds
/// non-finite entries or the eigendecomposition did not converge.
pub fn repair_covariance(covariance: &mut DMatrix<f64>, mode: CovarianceRepair) -> Option<bool> {
    if covariance.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let eigen = SymmetricEigen::try_new(covariance.clone(), f64::EPSILON, EIGEN_MAX_ITERATIONS)?;
    if eigen.eigenvalues.iter().all(|&ev| ev >= 0.0) {
        return Some(false);
    }

    let n = covariance.nrows();
    match mode {
        CovarianceRepair::Reset => covariance.fill(0.0),
        CovarianceRepair::ClipNegative => {
            let mut rebuilt = DMatrix::zeros(n, n);
            for (k, &ev) in eigen.eigenvalues.iter().enumerate() {
                if ev >= 0.0 {
                    let v = eigen.eigenvectors.column(k);
                    rebuilt.ger(ev, &v, &v, 1.0);
                }
            }

            // Rounding in the reconstruction can break exact symmetry
            *covariance = (&rebuilt + rebuilt.transpose()) * 0.5;
        }
    }
    Some(true)
}

/// Adapt paths, step size and covariance from one generation's selection
///
/// `previous` is the distribution the population was sampled from; `next`
/// already holds the recombined mean and receives everything else. Returns
/// `None` on numerical breakdown (p_σ could not be whitened or C could not be
/// eigendecomposed).
pub fn adapt<'a, I>(
    params: &StrategyParams,
    generation: usize,
    previous: &DistributionState,
    next: &mut DistributionState,
    root: &CovarianceRoot,
    step: &DVector<f64>,
    selected: I,
) -> Option<AdaptationReport>
where
    I: IntoIterator<Item = (f64, &'a DVector<f64>)>,
{
    let c_sigma = params.c_sigma;
    let c_c = params.c_c;
    let c_1 = params.c_1;
    let c_mu = params.c_mu;

    // Step-size path
    let whitened = root.whiten(step)?;
    let c_sigma_factor = (c_sigma * (2.0 - c_sigma) * params.mu_eff).sqrt();
    next.path_sigma = &previous.path_sigma * (1.0 - c_sigma) + whitened * c_sigma_factor;

    let path_sigma_norm = next.path_sigma.norm();
    next.sigma = update_step_size(previous.sigma, path_sigma_norm, params);

    // Covariance path and rank-one term
    let h_sigma = heaviside(path_sigma_norm, generation, params);
    let decay = 1.0 - c_1 - c_mu;

    if h_sigma {
        let c_c_factor = (c_c * (2.0 - c_c) * params.mu_eff).sqrt();
        next.path_c = &previous.path_c * (1.0 - c_c) + step * c_c_factor;

        next.covariance = &previous.covariance * decay;
        next.covariance.ger(c_1, &next.path_c, &next.path_c, 1.0);
    } else {
        next.path_c = &previous.path_c * (1.0 - c_c);

        next.covariance = &previous.covariance * (decay + c_1 * c_c * (2.0 - c_c));
        next.covariance.ger(c_1, &next.path_c, &next.path_c, 1.0);
    }

    // Rank-μ term
    for (w, offset) in selected {
        next.covariance.ger(c_mu * w, offset, offset, 1.0);
    }

    let repaired = repair_covariance(&mut next.covariance, params.covariance_repair)?;

    Some(AdaptationReport {
        h_sigma,
        path_sigma_norm,
        repaired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::cmaes::config::CmaEsConfig;
    use approx::assert_relative_eq;

    fn params(n: usize) -> StrategyParams {
        StrategyParams::new(n, &CmaEsConfig::default()).unwrap()
    }

    #[test]
    fn test_step_size_unchanged_at_expected_norm() {
        let p = params(6);
        assert_relative_eq!(update_step_size(2.0, p.chi_n, &p), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_step_size_direction() {
        let p = params(6);
        assert!(update_step_size(1.0, 0.0, &p) < 1.0);
        assert!(update_step_size(1.0, 3.0 * p.chi_n, &p) > 1.0);
    }

    #[test]
    fn test_step_size_damping_exponent() {
        let p = params(6);
        let textbook = StrategyParams {
            sigma_damping_exponent: 1.0,
            ..p.clone()
        };
        let damped = update_step_size(1.0, 0.0, &p).ln();
        let undamped = update_step_size(1.0, 0.0, &textbook).ln();
        assert_relative_eq!(damped, 0.3 * undamped, epsilon = 1e-12);
    }

    #[test]
    fn test_heaviside_gate() {
        let p = params(5);
        assert!(heaviside(0.0, 1, &p));
        assert!(!heaviside(10.0 * p.h_threshold, 1, &p));
    }

    #[test]
    fn test_repair_leaves_psd_untouched() {
        let mut c = DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);
        let before = c.clone();
        assert_eq!(repair_covariance(&mut c, CovarianceRepair::Reset), Some(false));
        assert_eq!(c, before);
        assert_eq!(repair_covariance(&mut c, CovarianceRepair::ClipNegative), Some(false));
        assert_eq!(c, before);
    }

    #[test]
    fn test_reset_zeroes_on_any_negative_eigenvalue() {
        let mut c = DMatrix::from_diagonal(&DVector::from_vec(vec![3.0, 2.0, -1e-12]));
        assert_eq!(repair_covariance(&mut c, CovarianceRepair::Reset), Some(true));
        assert!(c.iter().all(|&v| v == 0.0));
        assert!(CovarianceRoot::factor(&c).is_none());
    }

    #[test]
    fn test_clip_drops_only_negative_pairs() {
        let mut c = DMatrix::from_diagonal(&DVector::from_vec(vec![3.0, 2.0, -1e-12]));
        assert_eq!(repair_covariance(&mut c, CovarianceRepair::ClipNegative), Some(true));
        assert_relative_eq!(c[(0, 0)], 3.0, epsilon = 1e-12);
        assert_relative_eq!(c[(1, 1)], 2.0, epsilon = 1e-12);
        assert_relative_eq!(c[(2, 2)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_repair_removes_negative_subspace() {
        // Eigenvalues 3 and -1 with eigenvectors (1, 1)/√2 and (1, -1)/√2
        let mut c = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert_eq!(repair_covariance(&mut c, CovarianceRepair::ClipNegative), Some(true));
        for v in c.iter() {
            assert_relative_eq!(*v, 1.5, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_repair_all_negative_gives_zero() {
        let mut c = DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, -2.0]);
        assert_eq!(repair_covariance(&mut c, CovarianceRepair::ClipNegative), Some(true));
        assert!(c.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_repair_rejects_non_finite() {
        let mut c = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, f64::NAN, 1.0]);
        assert_eq!(repair_covariance(&mut c, CovarianceRepair::Reset), None);
    }

    #[test]
    fn test_adapt_resets_indefinite_covariance_by_default() {
        let p = params(3);
        let mut previous = DistributionState::initial(DVector::zeros(3), 1.0);
        previous.covariance = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 1.0, -1.0]));
        let mut next = previous.clone();
        let root = CovarianceRoot::factor(&DMatrix::identity(3, 3)).unwrap();

        let step = DVector::zeros(3);
        let report = adapt(&p, 1, &previous, &mut next, &root, &step, std::iter::empty()).unwrap();

        assert!(report.repaired);
        assert!(next.covariance.iter().all(|&v| v == 0.0));
        assert!(CovarianceRoot::factor(&next.covariance).is_none());
    }

    #[test]
    fn test_adapt_keeps_covariance_symmetric() {
        let p = params(3);
        let previous = DistributionState::initial(DVector::zeros(3), 1.0);
        let mut next = previous.clone();
        let root = CovarianceRoot::factor(&previous.covariance).unwrap();

        let offsets = vec![
            DVector::from_vec(vec![0.5, -0.2, 0.1]),
            DVector::from_vec(vec![0.3, 0.4, -0.6]),
        ];
        let weights = [0.7, 0.3];
        let step = &offsets[0] * weights[0] + &offsets[1] * weights[1];

        let report = adapt(
            &p,
            1,
            &previous,
            &mut next,
            &root,
            &step,
            weights.iter().copied().zip(offsets.iter()),
        )
        .unwrap();

        assert!(report.h_sigma);
        assert!(next.sigma > 0.0);
        assert_eq!(next.covariance, next.covariance.transpose());
        assert_relative_eq!(report.path_sigma_norm, next.path_sigma.norm());
    }

    #[test]
    fn test_adapt_blocked_gate_does_not_inject_step() {
        let p = params(3);
        let mut previous = DistributionState::initial(DVector::zeros(3), 1.0);
        previous.path_c = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let mut next = previous.clone();
        let root = CovarianceRoot::factor(&previous.covariance).unwrap();

        // A huge step saturates p_σ and closes the gate
        let step = DVector::from_vec(vec![100.0, 100.0, 100.0]);
        let report = adapt(&p, 1, &previous, &mut next, &root, &step, std::iter::empty()).unwrap();

        assert!(!report.h_sigma);
        assert_relative_eq!(next.path_c[0], 1.0 - p.c_c, epsilon = 1e-12);
        assert_eq!(next.path_c[1], 0.0);

        let pc0 = next.path_c[0];
        let expected_11 = (1.0 - p.c_1 - p.c_mu) + p.c_1 * (pc0 * pc0 + p.c_c * (2.0 - p.c_c));
        assert_relative_eq!(next.covariance[(0, 0)], expected_11, epsilon = 1e-12);
    }
}
