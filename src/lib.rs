//! # cmaes-evo
//!
//! A derandomized CMA-ES engine for black-box minimization over continuous
//! spaces.
//!
//! The caller supplies a starting point in a flat real vector space and an
//! objective that maps each candidate to a cost. The optimizer samples
//! candidates from a multivariate normal distribution, keeps the better half
//! and adapts the distribution's mean, step size and covariance until the
//! run converges, the budget is spent or the numbers break down.
//!
//! ## Core Concepts
//!
//! - **Evaluators**: anything implementing [`Evaluator`](fitness::traits::Evaluator), closures included
//! - **Codecs**: map the flat search vector onto a domain value, e.g. a bounded box
//! - **Outcomes, not errors**: numerical failures end the run with a
//!   [`TerminationReason`](termination::TerminationReason) and the best point found so far
//!
//! ## Quick Start
//!
//! ```rust
//! use cmaes_evo::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let result = optimize(&[3.0, -2.0, 1.0], 3, ObjectiveKind::Sphere, &mut rng)?;
//! assert!(result.best_cost < 1e-6);
//! # Ok::<(), cmaes_evo::error::EvolutionError>(())
//! ```
//!
//! For custom objectives and domains, use the builder:
//!
//! ```rust
//! use cmaes_evo::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let codec = BoundedCodec::new(MultiBounds::symmetric(5.0, 2));
//!
//! let mut cmaes = CmaEsBuilder::new()
//!     .encoded_mean(&codec, &vec![2.0, -1.0])?
//!     .sigma(0.3)
//!     .max_generations(200)
//!     .build()?;
//!
//! let result = cmaes.run(&codec, &|x: &Vec<f64>| (x[0] - 1.0).powi(2) + x[1].powi(2), &mut rng)?;
//! let best = result.decode(&codec);
//! assert_eq!(best.len(), 2);
//! # Ok::<(), cmaes_evo::error::EvolutionError>(())
//! ```

pub mod algorithms;
pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod fitness;
pub mod termination;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::encoding::prelude::*;
    pub use crate::error::*;
    pub use crate::fitness::prelude::*;
    pub use crate::termination::prelude::*;
}
