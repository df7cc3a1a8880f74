//! Double-buffered distribution state
//!
//! Every generation reads the *previous* slot and writes the *current* slot;
//! the slots are then swapped so the freshly written state becomes the input
//! of the next generation. No update formula ever reads a value it is
//! overwriting.

use nalgebra::{DMatrix, DVector};

/// Search distribution of one generation
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionState {
    /// Mean of the search distribution (m)
    pub mean: DVector<f64>,
    /// Global step size (σ)
    pub sigma: f64,
    /// Evolution path for σ adaptation (p_σ)
    pub path_sigma: DVector<f64>,
    /// Evolution path for C adaptation (p_c)
    pub path_c: DVector<f64>,
    /// Covariance matrix (C)
    pub covariance: DMatrix<f64>,
}

impl DistributionState {
    /// Fresh state: zero paths, identity covariance
    pub fn initial(mean: DVector<f64>, sigma: f64) -> Self {
        let n = mean.len();
        Self {
            mean,
            sigma,
            path_sigma: DVector::zeros(n),
            path_c: DVector::zeros(n),
            covariance: DMatrix::identity(n, n),
        }
    }

    /// Problem dimension
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }
}

/// Two slots of the same state, swapped rather than copied
#[derive(Clone, Debug)]
pub struct DoubleBuffer<T> {
    previous: T,
    current: T,
}

impl<T: Clone> DoubleBuffer<T> {
    /// Start with both slots holding the same value
    pub fn new(initial: T) -> Self {
        Self {
            current: initial.clone(),
            previous: initial,
        }
    }
}

impl<T> DoubleBuffer<T> {
    /// State the next generation reads from
    pub fn previous(&self) -> &T {
        &self.previous
    }

    /// Scratch slot the running generation writes into
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Read-only previous slot together with the writable current slot
    pub fn split(&mut self) -> (&T, &mut T) {
        (&self.previous, &mut self.current)
    }

    /// Publish the current slot as the next generation's input
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
    }
}
