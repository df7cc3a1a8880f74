//! Per-variable bounds used by the bounded codec
//!
//! Bounds describe the box a normalized search variable is mapped onto. The
//! optimizer never enforces them; a decoded value may leave its box when the
//! search distribution wanders outside `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};

/// Bounds for a single variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
}

impl Bounds {
    /// Create new bounds
    ///
    /// # Panics
    /// Panics if the bounds are not finite or `min >= max`
    pub fn new(min: f64, max: f64) -> Self {
        match Self::try_new(min, max) {
            Ok(bounds) => bounds,
            Err(err) => panic!("{}", err),
        }
    }

    /// Create new bounds, rejecting empty or non-finite intervals
    pub fn try_new(min: f64, max: f64) -> EvoResult<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(EvolutionError::Configuration(format!(
                "Invalid bounds: min ({}) must be finite and < max ({})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Create symmetric bounds centered at 0
    pub fn symmetric(half_width: f64) -> Self {
        Self::new(-half_width, half_width)
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Check if a value is within bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Normalize a value from bounds to [0, 1]
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    /// Denormalize a value from [0, 1] to bounds
    pub fn denormalize(&self, value: f64) -> f64 {
        self.min + value * self.range()
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// Bounds for every variable of a search vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBounds {
    /// Bounds for each dimension
    pub bounds: Vec<Bounds>,
}

impl MultiBounds {
    /// Create new multi-dimensional bounds
    pub fn new(bounds: Vec<Bounds>) -> Self {
        Self { bounds }
    }

    /// Create uniform bounds for all dimensions
    pub fn uniform(bound: Bounds, dimension: usize) -> Self {
        Self {
            bounds: vec![bound; dimension],
        }
    }

    /// Create symmetric bounds for all dimensions
    pub fn symmetric(half_width: f64, dimension: usize) -> Self {
        Self::uniform(Bounds::symmetric(half_width), dimension)
    }

    /// Get number of dimensions
    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }

    /// Get bounds for a specific dimension
    pub fn get(&self, index: usize) -> Option<&Bounds> {
        self.bounds.get(index)
    }

    /// Check if all values are within bounds
    pub fn contains_vec(&self, values: &[f64]) -> bool {
        values.len() == self.bounds.len()
            && values
                .iter()
                .zip(&self.bounds)
                .all(|(&v, b)| b.contains(v))
    }
}

impl FromIterator<Bounds> for MultiBounds {
    fn from_iter<I: IntoIterator<Item = Bounds>>(iter: I) -> Self {
        Self {
            bounds: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(f64, f64)> for MultiBounds {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        Self {
            bounds: iter.into_iter().map(Bounds::from).collect(),
        }
    }
}
