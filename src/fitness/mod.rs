//! Objective evaluation
//!
//! This module defines the evaluator contract and the built-in benchmark objectives.

pub mod benchmarks;
pub mod traits;

pub mod prelude {
    pub use super::benchmarks::*;
    pub use super::traits::*;
}
