//! Benchmark objectives
//!
//! Standard test functions for exercising the optimizer, plus the
//! [`ObjectiveKind`] selector that picks one of them by name.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvolutionError;
use crate::fitness::traits::Evaluator;

/// Trait for benchmark functions
pub trait BenchmarkFunction: Send + Sync {
    /// Name of the benchmark function
    fn name(&self) -> &'static str;

    /// Optimal (minimum) cost
    fn optimal_fitness(&self) -> f64;

    /// Optimal solution for the given dimension (if known)
    fn optimal_solution(&self, dimension: usize) -> Option<Vec<f64>>;

    /// Evaluate the function (returns value to be MINIMIZED)
    fn evaluate_raw(&self, x: &[f64]) -> f64;
}

/// Sphere function: f(x) = Σxᵢ²
///
/// Unimodal, convex, separable. Optimum at origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sphere;

impl BenchmarkFunction for Sphere {
    fn name(&self) -> &'static str {
        "Sphere"
    }

    fn optimal_fitness(&self) -> f64 {
        0.0
    }

    fn optimal_solution(&self, dimension: usize) -> Option<Vec<f64>> {
        Some(vec![0.0; dimension])
    }

    fn evaluate_raw(&self, x: &[f64]) -> f64 {
        x.iter().map(|xi| xi * xi).sum()
    }
}

/// Ellipsoid function: f(x) = Σ κ^(i/(n-1)) xᵢ²
///
/// Convex but ill-conditioned with condition number κ. Rewards covariance
/// learning: an isotropic search stalls along the steep axes.
#[derive(Clone, Copy, Debug)]
pub struct Ellipsoid {
    /// Ratio between the steepest and the flattest axis
    pub condition: f64,
}

impl Ellipsoid {
    /// Create an ellipsoid with the given condition number
    pub fn new(condition: f64) -> Self {
        Self { condition }
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::new(1e6)
    }
}

impl BenchmarkFunction for Ellipsoid {
    fn name(&self) -> &'static str {
        "Ellipsoid"
    }

    fn optimal_fitness(&self) -> f64 {
        0.0
    }

    fn optimal_solution(&self, dimension: usize) -> Option<Vec<f64>> {
        Some(vec![0.0; dimension])
    }

    fn evaluate_raw(&self, x: &[f64]) -> f64 {
        let n = x.len();
        if n < 2 {
            return x.iter().map(|xi| xi * xi).sum();
        }
        x.iter()
            .enumerate()
            .map(|(i, xi)| self.condition.powf(i as f64 / (n - 1) as f64) * xi * xi)
            .sum()
    }
}

/// Rosenbrock function: f(x) = Σ[100(xᵢ₊₁-xᵢ²)² + (1-xᵢ)²]
///
/// Valley structure, non-separable. Optimum at (1,1,...,1).
#[derive(Clone, Copy, Debug, Default)]
pub struct Rosenbrock;

impl BenchmarkFunction for Rosenbrock {
    fn name(&self) -> &'static str {
        "Rosenbrock"
    }

    fn optimal_fitness(&self) -> f64 {
        0.0
    }

    fn optimal_solution(&self, dimension: usize) -> Option<Vec<f64>> {
        Some(vec![1.0; dimension])
    }

    fn evaluate_raw(&self, x: &[f64]) -> f64 {
        x.windows(2)
            .map(|w| {
                let a = w[1] - w[0] * w[0];
                let b = 1.0 - w[0];
                100.0 * a * a + b * b
            })
            .sum()
    }
}

/// Rastrigin function: f(x) = 10n + Σ(xᵢ² - 10cos(2πxᵢ))
///
/// Highly multimodal with many local minima. Optimum at origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rastrigin;

impl BenchmarkFunction for Rastrigin {
    fn name(&self) -> &'static str {
        "Rastrigin"
    }

    fn optimal_fitness(&self) -> f64 {
        0.0
    }

    fn optimal_solution(&self, dimension: usize) -> Option<Vec<f64>> {
        Some(vec![0.0; dimension])
    }

    fn evaluate_raw(&self, x: &[f64]) -> f64 {
        let a = 10.0;
        let n = x.len() as f64;
        a * n
            + x.iter()
                .map(|xi| xi * xi - a * (2.0 * PI * xi).cos())
                .sum::<f64>()
    }
}

/// Flat objective returning the same cost everywhere
#[derive(Clone, Copy, Debug)]
pub struct Constant(pub f64);

impl BenchmarkFunction for Constant {
    fn name(&self) -> &'static str {
        "Constant"
    }

    fn optimal_fitness(&self) -> f64 {
        self.0
    }

    fn optimal_solution(&self, _dimension: usize) -> Option<Vec<f64>> {
        None
    }

    fn evaluate_raw(&self, _x: &[f64]) -> f64 {
        self.0
    }
}

/// Runtime selector over the built-in objectives
///
/// Resolved once when a run is set up; evaluation dispatches on the tag.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Sum of squares
    Sphere,
    /// Ill-conditioned quadratic
    Ellipsoid { condition: f64 },
    /// Banana valley
    Rosenbrock,
    /// Multimodal cosine landscape
    Rastrigin,
    /// Same cost everywhere
    Constant { value: f64 },
}

impl ObjectiveKind {
    /// Borrow the benchmark this selector names
    pub fn benchmark(&self) -> Box<dyn BenchmarkFunction> {
        match *self {
            Self::Sphere => Box::new(Sphere),
            Self::Ellipsoid { condition } => Box::new(Ellipsoid::new(condition)),
            Self::Rosenbrock => Box::new(Rosenbrock),
            Self::Rastrigin => Box::new(Rastrigin),
            Self::Constant { value } => Box::new(Constant(value)),
        }
    }

    /// Evaluate the selected objective on a flat vector
    pub fn evaluate_raw(&self, x: &[f64]) -> f64 {
        match *self {
            Self::Sphere => Sphere.evaluate_raw(x),
            Self::Ellipsoid { condition } => Ellipsoid::new(condition).evaluate_raw(x),
            Self::Rosenbrock => Rosenbrock.evaluate_raw(x),
            Self::Rastrigin => Rastrigin.evaluate_raw(x),
            Self::Constant { value } => value,
        }
    }
}

impl Evaluator<Vec<f64>> for ObjectiveKind {
    fn evaluate(&self, candidate: &Vec<f64>) -> f64 {
        self.evaluate_raw(candidate)
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.benchmark().name())
    }
}

impl FromStr for ObjectiveKind {
    type Err = EvolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sphere" => Ok(Self::Sphere),
            "ellipsoid" => Ok(Self::Ellipsoid { condition: 1e6 }),
            "rosenbrock" => Ok(Self::Rosenbrock),
            "rastrigin" => Ok(Self::Rastrigin),
            other => Err(EvolutionError::Configuration(format!(
                "Unknown objective kind: {}",
                other
            ))),
        }
    }
}
