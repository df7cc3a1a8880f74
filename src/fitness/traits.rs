//! Evaluator traits
//!
//! The optimizer minimizes: lower cost is better. Evaluators must be
//! deterministic for a fixed input; the optimizer re-evaluates nothing and
//! assumes a repeated call would return the same cost.

use std::marker::PhantomData;

/// Maps a decoded candidate to a scalar cost (lower is better)
///
/// Non-finite costs are allowed; they rank last and a non-finite best-ever
/// cost ends the run as a failure.
#[cfg(feature = "parallel")]
pub trait Evaluator<D: ?Sized>: Send + Sync {
    /// Evaluate the cost of a decoded candidate
    fn evaluate(&self, candidate: &D) -> f64;
}

/// Maps a decoded candidate to a scalar cost (lower is better)
///
/// Non-finite costs are allowed; they rank last and a non-finite best-ever
/// cost ends the run as a failure.
#[cfg(not(feature = "parallel"))]
pub trait Evaluator<D: ?Sized> {
    /// Evaluate the cost of a decoded candidate
    fn evaluate(&self, candidate: &D) -> f64;
}

/// Implement Evaluator for any Fn that matches the signature
#[cfg(feature = "parallel")]
impl<D: ?Sized, F> Evaluator<D> for F
where
    F: Fn(&D) -> f64 + Send + Sync,
{
    fn evaluate(&self, candidate: &D) -> f64 {
        self(candidate)
    }
}

/// Implement Evaluator for any Fn that matches the signature
#[cfg(not(feature = "parallel"))]
impl<D: ?Sized, F> Evaluator<D> for F
where
    F: Fn(&D) -> f64,
{
    fn evaluate(&self, candidate: &D) -> f64 {
        self(candidate)
    }
}

/// Counts how often an inner evaluator is called
///
/// Handy for checking evaluation budgets in tests and drivers.
pub struct CountingEvaluator<E, D: ?Sized> {
    inner: E,
    calls: std::sync::atomic::AtomicUsize,
    _marker: PhantomData<fn(&D)>,
}

impl<E, D: ?Sized> CountingEvaluator<E, D> {
    /// Wrap an evaluator
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: std::sync::atomic::AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Number of evaluations performed so far
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl<E, D> Evaluator<D> for CountingEvaluator<E, D>
where
    E: Evaluator<D>,
    D: ?Sized,
{
    fn evaluate(&self, candidate: &D) -> f64 {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.inner.evaluate(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_evaluator() {
        let sphere = |x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>();
        assert_eq!(sphere.evaluate(&vec![1.0, 2.0, 3.0]), 14.0);
    }

    #[test]
    fn test_slice_evaluator() {
        let sum = |x: &[f64]| x.iter().sum::<f64>();
        assert_eq!(Evaluator::<[f64]>::evaluate(&sum, &[1.0, 2.0][..]), 3.0);
    }

    #[test]
    fn test_counting_evaluator() {
        let counting = CountingEvaluator::new(|x: &Vec<f64>| x[0]);
        assert_eq!(counting.calls(), 0);
        counting.evaluate(&vec![1.0]);
        counting.evaluate(&vec![2.0]);
        assert_eq!(counting.calls(), 2);
    }
}
