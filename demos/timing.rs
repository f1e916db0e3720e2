use lloyd::{Kmeans, Parallelism};
use log::info;
use rand::prelude::*;
use std::time::Instant;

// Uniform points in [0, 1)^100, k = 1000, timed across worker counts.
const SIZES: [usize; 3] = [5000, 7500, 10000];
const DIM: usize = 100;
const K: usize = 1000;
const SEED: u64 = 111;

fn random_points(n: usize, dim: usize, rng: &mut impl Rng) -> Vec<Vec<f32>> {
    (0..n)
        .map(|_| (0..dim).map(|_| rng.random::<f32>()).collect())
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(SEED);
    let strategies = [
        ("sequential", Parallelism::Sequential),
        ("workers_1", Parallelism::Workers(1)),
        ("workers_2", Parallelism::Workers(2)),
        ("workers_4", Parallelism::Workers(4)),
        ("workers_all", Parallelism::Workers(0)),
    ];

    for n in SIZES {
        println!("====={n}====");
        let points = random_points(n, DIM, &mut rng);

        for (name, parallelism) in strategies {
            let kmeans = Kmeans::new(K)
                .with_seed(SEED)
                .with_parallelism(parallelism);

            let start = Instant::now();
            let fit = kmeans.fit(&points)?;
            let elapsed = start.elapsed();

            info!(
                "{name}: {} iterations, converged={}",
                fit.iterations, fit.converged
            );
            println!(
                "{name}: {n} points fitted in: {:.4} seconds",
                elapsed.as_secs_f64()
            );
        }
    }

    Ok(())
}
