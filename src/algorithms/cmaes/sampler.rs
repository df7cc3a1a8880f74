//! Population sampling from the adapted Gaussian
//!
//! Offsets are drawn as `L·z` with `L` the lower Cholesky factor of C and
//! `z ~ N(0, I)`; candidates are `m + σ·L·z`. Vectors are columns throughout.

use nalgebra::{Cholesky, DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

/// Lower-triangular Cholesky root of the covariance matrix
#[derive(Clone, Debug)]
pub struct CovarianceRoot {
    lower: DMatrix<f64>,
}

impl CovarianceRoot {
    /// Factor C = L·Lᵀ, or `None` when C is not positive-definite
    pub fn factor(covariance: &DMatrix<f64>) -> Option<Self> {
        if covariance.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Cholesky::new(covariance.clone()).map(|chol| Self { lower: chol.l() })
    }

    /// The lower-triangular factor L
    pub fn lower(&self) -> &DMatrix<f64> {
        &self.lower
    }

    /// Map standard-normal noise into the covariance shape: L·z
    pub fn transform(&self, z: &DVector<f64>) -> DVector<f64> {
        &self.lower * z
    }

    /// Undo the covariance shape: L⁻¹·y, by forward substitution
    pub fn whiten(&self, y: &DVector<f64>) -> Option<DVector<f64>> {
        self.lower.solve_lower_triangular(y)
    }
}

/// λ sampled offsets and the candidate points they produce
#[derive(Clone, Debug)]
pub struct Population {
    /// Offsets L·zₖ, in population index order
    pub offsets: Vec<DVector<f64>>,
    /// Candidates m + σ·L·zₖ, in population index order
    pub candidates: Vec<DVector<f64>>,
}

impl Population {
    /// Draw a full population
    ///
    /// All noise is drawn before any candidate is evaluated, so how the
    /// evaluation is scheduled never changes which points are sampled.
    pub fn sample<R: Rng + ?Sized>(
        root: &CovarianceRoot,
        mean: &DVector<f64>,
        sigma: f64,
        lambda: usize,
        rng: &mut R,
    ) -> Self {
        let n = mean.len();

        let offsets: Vec<DVector<f64>> = (0..lambda)
            .map(|_| {
                let z = DVector::from_fn(n, |_, _| rng.sample::<f64, _>(StandardNormal));
                root.transform(&z)
            })
            .collect();

        let candidates = offsets.iter().map(|y| mean + y * sigma).collect();

        Self {
            offsets,
            candidates,
        }
    }

    /// Population size
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when no candidates were drawn
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
