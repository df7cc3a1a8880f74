//! Encode/decode between domain quantities and flat search vectors
//!
//! The optimizer only ever sees flat `f64` vectors. A [`Codec`] maps those
//! vectors to whatever structure the objective consumes, and builds the
//! starting vector from a domain-level initial guess.

use crate::encoding::bounds::MultiBounds;
use crate::error::{ensure_dimension, EvoResult};

/// Mapping between flat search vectors and decoded candidates
#[cfg(feature = "parallel")]
pub trait Codec: Send + Sync {
    /// Domain representation handed to the evaluator
    type Decoded;

    /// Number of variables, if the codec fixes it
    fn dimension(&self) -> Option<usize>;

    /// Build a flat search vector from a domain value
    fn encode(&self, decoded: &Self::Decoded) -> EvoResult<Vec<f64>>;

    /// Interpret a flat search vector
    fn decode(&self, x: &[f64]) -> Self::Decoded;
}

/// Mapping between flat search vectors and decoded candidates
#[cfg(not(feature = "parallel"))]
pub trait Codec {
    /// Domain representation handed to the evaluator
    type Decoded;

    /// Number of variables, if the codec fixes it
    fn dimension(&self) -> Option<usize>;

    /// Build a flat search vector from a domain value
    fn encode(&self, decoded: &Self::Decoded) -> EvoResult<Vec<f64>>;

    /// Interpret a flat search vector
    fn decode(&self, x: &[f64]) -> Self::Decoded;
}

/// Pass-through codec: the objective works on the flat vector itself
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityCodec;

impl Codec for IdentityCodec {
    type Decoded = Vec<f64>;

    fn dimension(&self) -> Option<usize> {
        None
    }

    fn encode(&self, decoded: &Vec<f64>) -> EvoResult<Vec<f64>> {
        Ok(decoded.clone())
    }

    fn decode(&self, x: &[f64]) -> Vec<f64> {
        x.to_vec()
    }
}

/// Affine codec: variable `i` decodes to `min_i + x_i * (max_i - min_i)`
///
/// Search happens in normalized units so one step size fits variables of very
/// different scale. Decoded values are not clamped to their bounds.
#[derive(Clone, Debug)]
pub struct BoundedCodec {
    bounds: MultiBounds,
}

impl BoundedCodec {
    /// Create a codec over the given per-variable bounds
    pub fn new(bounds: MultiBounds) -> Self {
        Self { bounds }
    }

    /// The bounds each variable is mapped onto
    pub fn bounds(&self) -> &MultiBounds {
        &self.bounds
    }
}

impl Codec for BoundedCodec {
    type Decoded = Vec<f64>;

    fn dimension(&self) -> Option<usize> {
        Some(self.bounds.dimension())
    }

    fn encode(&self, decoded: &Vec<f64>) -> EvoResult<Vec<f64>> {
        ensure_dimension(self.bounds.dimension(), decoded.len())?;
        Ok(decoded
            .iter()
            .zip(&self.bounds.bounds)
            .map(|(&v, b)| b.normalize(v))
            .collect())
    }

    fn decode(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.bounds.bounds)
            .map(|(&v, b)| b.denormalize(v))
            .collect()
    }
}
