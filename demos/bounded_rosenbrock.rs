//! Bounded Rosenbrock Example
//!
//! This example searches a box-bounded domain through a `BoundedCodec`:
//! the optimizer works on unit-scaled coordinates and the objective sees
//! values mapped into `[-5, 5]` per variable.

use cmaes_evo::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Bounded Rosenbrock ===\n");

    let mut rng = StdRng::seed_from_u64(7);

    const DIM: usize = 4;

    let codec = BoundedCodec::new(MultiBounds::symmetric(5.0, DIM));
    let objective = |x: &Vec<f64>| ObjectiveKind::Rosenbrock.evaluate_raw(x);

    println!("Problem: {}-D Rosenbrock on [-5, 5]^{}", DIM, DIM);
    println!("Global optimum: 0.0 at (1, 1, ..., 1)\n");

    let mut cmaes = CmaEsBuilder::new()
        .encoded_mean(&codec, &vec![-1.0; DIM])?
        .sigma(0.1)
        .max_generations(1000)
        .build()?;

    let result = cmaes.run(&codec, &objective, &mut rng)?;
    let best = result.decode(&codec);

    println!("Results:");
    println!("  Termination: {}", result.reason);
    println!("  Best cost: {:.10}", result.best_cost);
    println!("  Generations: {}", result.generations);
    println!("  Evaluations: {}", result.evaluations);

    println!("\nBest solution (decoded):");
    for (i, val) in best.iter().enumerate() {
        println!("  x[{}] = {:.6}", i, val);
    }

    let distance_from_opt: f64 = best
        .iter()
        .map(|x| (x - 1.0).powi(2))
        .sum::<f64>()
        .sqrt();
    println!("\nDistance from optimum: {:.10}", distance_from_opt);

    if !result.is_success() {
        println!("\nRun ended with a failure: {}", result.reason.description());
    }

    Ok(())
}
