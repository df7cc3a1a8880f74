//! Error types for cmaes-evo
//!
//! Errors here describe invalid inputs rejected before a run starts. Run
//! outcomes such as numerical breakdown or budget exhaustion are reported
//! through [`TerminationReason`](crate::termination::TerminationReason), never
//! as errors, so a caller always receives the best-ever result.

use thiserror::Error;

/// Top-level error type for optimizer setup
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvolutionError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Search space has no variables
    #[error("Search space dimension must be positive")]
    EmptyDimension,
}

/// Result type alias for optimizer operations
pub type EvoResult<T> = Result<T, EvolutionError>;

/// Check that a vector has the dimension the caller declared
pub(crate) fn ensure_dimension(expected: usize, actual: usize) -> EvoResult<()> {
    if expected == 0 {
        return Err(EvolutionError::EmptyDimension);
    }
    if expected != actual {
        return Err(EvolutionError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evolution_error_display() {
        let err = EvolutionError::Configuration("sigma must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: sigma must be positive"
        );

        let err = EvolutionError::DimensionMismatch {
            expected: 10,
            actual: 5,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 10, got 5");

        assert_eq!(
            EvolutionError::EmptyDimension.to_string(),
            "Search space dimension must be positive"
        );
    }

    #[test]
    fn test_ensure_dimension() {
        assert!(ensure_dimension(3, 3).is_ok());
        assert_eq!(ensure_dimension(0, 0), Err(EvolutionError::EmptyDimension));
        assert_eq!(
            ensure_dimension(4, 2),
            Err(EvolutionError::DimensionMismatch {
                expected: 4,
                actual: 2
            })
        );
    }
}
