//! Sphere Function Optimization Example
//!
//! This example runs CMA-ES on the sphere function with the default
//! configuration and prints the trajectory of the best cost.

use cmaes_evo::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Sphere Function Optimization ===\n");

    let mut rng = StdRng::seed_from_u64(42);

    const DIM: usize = 10;

    // Start at distance 10 from the optimum
    let initial: Vec<f64> = vec![10.0 / (DIM as f64).sqrt(); DIM];

    let mut cmaes = CmaEsBuilder::new()
        .mean(initial)
        .record_history(true)
        .build()?;

    println!("Problem: {}-D {}", DIM, ObjectiveKind::Sphere);
    println!(
        "Population: lambda = {}, mu = {}\n",
        cmaes.params().lambda,
        cmaes.params().mu
    );

    let result = cmaes.minimize(&ObjectiveKind::Sphere, &mut rng)?;

    for stats in result.history.iter().step_by(10) {
        println!(
            "Gen {:4}: best = {:.6e}, sigma = {:.4e}",
            stats.generation, stats.best_cost, stats.sigma
        );
    }

    println!("\nResults:");
    println!("  Termination: {}", result.reason);
    println!("  Best cost: {:.6e}", result.best_cost);
    println!("  Generations: {}", result.generations);
    println!("  Evaluations: {}", result.evaluations);
    println!("  Final sigma: {:.6e}", result.final_sigma);

    println!("\nBest solution:");
    for (i, val) in result.best_solution.iter().enumerate().take(5) {
        println!("  x[{}] = {:.6}", i, val);
    }
    if DIM > 5 {
        println!("  ... ({} more dimensions)", DIM - 5);
    }

    Ok(())
}
