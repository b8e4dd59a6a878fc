//! Benchmark: least-squares weights of a Hawkes process with a varying
//! baseline.
//!
//! Simulates four realizations of a 2-node process (6 baseline slots over a
//! period of 300, decays 0.5 / 2 / 6, branching spectral radius 0.5) on
//! `[0, number)`, then fits the least-squares model with `threads` workers
//! and recomputes its weights. Only timings are reported.
use std::time::Instant;

use clap::Parser;
use hawkes_optim::{
    hawkes::{ModelHawkesSumExpKernLeastSq, SimuHawkesMulti, SimuHawkesSumExpKernels},
    logging,
};
use ndarray::{array, Array3};

const PERIOD_LENGTH: f64 = 300.0;
const SEED: u64 = 2093;
const SPECTRAL_RADIUS: f64 = 0.5;
const N_SIMULATIONS: usize = 4;

#[derive(Parser)]
#[command(name = "hawkes_varying_baseline")]
#[command(about = "Time Hawkes least-squares weight computation with a periodic baseline")]
struct Args {
    /// Number of worker threads used to compute the weights
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// End time of each simulated realization
    #[arg(short, long, default_value_t = 50_000)]
    number: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_cli_logger(false);

    let baselines = array![[0.3, 0.5, 0.6, 0.4, 0.2, 0.0], [0.8, 0.5, 0.2, 0.3, 0.3, 0.4]];
    let n_baselines = baselines.ncols();
    let decays = array![0.5, 2.0, 6.0];
    let adjacency = Array3::from_shape_vec(
        (2, 2, 3),
        vec![0.0, 0.1, 0.4, 0.2, 0.0, 0.2, 0.0, 0.0, 0.0, 0.6, 0.3, 0.0],
    )?;

    let mut hawkes = SimuHawkesSumExpKernels::new(
        baselines,
        PERIOD_LENGTH,
        decays.clone(),
        adjacency,
        args.number as f64,
        SEED,
    )?;
    hawkes.adjust_spectral_radius(SPECTRAL_RADIUS)?;

    let clock = Instant::now();
    let realizations = SimuHawkesMulti::new(hawkes, N_SIMULATIONS)?.simulate()?;
    let n_jumps: usize = realizations.iter().map(|r| r.n_jumps()).sum();
    tracing::info!(
        n_simulations = N_SIMULATIONS,
        n_jumps,
        elapsed_s = clock.elapsed().as_secs_f64(),
        "simulation done"
    );

    let clock = Instant::now();
    let mut model =
        ModelHawkesSumExpKernLeastSq::new(decays, n_baselines, PERIOD_LENGTH, args.threads)?;
    model.fit(realizations)?;
    tracing::info!(threads = args.threads, elapsed_s = clock.elapsed().as_secs_f64(), "fit done");

    let clock = Instant::now();
    model.compute_weights()?;
    tracing::info!(
        threads = args.threads,
        elapsed_s = clock.elapsed().as_secs_f64(),
        "compute_weights done"
    );
    Ok(())
}
