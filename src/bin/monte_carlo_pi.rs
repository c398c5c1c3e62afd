//! Monte Carlo pi - every rank samples its share of points, rank 0 combines
//! the estimates.
//!
//! Run with: mpiexec -n 4 ./target/release/monte_carlo_pi [SAMPLES] [SEED]

use hellompi::logging::init_logging;
use hellompi::pi::{
    count_inside, estimate, parse_samples, rank_seed, samples_for_rank, theoretical_error, Spread,
};
use hellompi::{parse_seed, Communicator, Mpi, ReduceOp, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;
use std::process::ExitCode;

const ROOT: i32 = 0;

fn main() -> ExitCode {
    let mpi = match Mpi::init() {
        Ok(mpi) => mpi,
        Err(e) => {
            eprintln!("monte_carlo_pi: failed to join the MPI group: {e}");
            return ExitCode::FAILURE;
        }
    };
    let world = mpi.world();
    init_logging(world.rank());

    let mut args = std::env::args().skip(1);
    let (samples_arg, seed_arg) = (args.next(), args.next());
    if let Err(e) = run(&world, samples_arg.as_deref(), seed_arg.as_deref()) {
        eprintln!("monte_carlo_pi: rank {}: {e}", world.rank());
        world.abort(1);
    }

    drop(mpi);
    ExitCode::SUCCESS
}

fn run(world: &Communicator, samples_arg: Option<&str>, seed_arg: Option<&str>) -> Result<()> {
    let rank = world.rank();
    let size = world.size();
    let total = parse_samples(samples_arg)?;
    let local_samples = samples_for_rank(total, rank, size)?;

    // Every rank must draw from the same base seed
    let mut seed = [parse_seed(seed_arg)?];
    world.broadcast(&mut seed, ROOT)?;
    log::debug!("base seed {}", seed[0]);

    if rank == ROOT {
        println!("=== MPI Monte Carlo Pi Estimation ===");
        println!("Total samples: {total}");
        println!("Samples per process: {local_samples}");
        println!("Number of processes: {size}");
        println!("Actual value of π: {PI:.10}");
        println!();
    }

    world.barrier()?;
    let start = Mpi::wtime();

    let mut rng = StdRng::seed_from_u64(rank_seed(seed[0], rank));
    let inside = count_inside(&mut rng, local_samples);
    let local_pi = estimate(inside, local_samples);
    println!("Process {rank}: Local π estimate = {local_pi:.8}");

    let pi_sum = world.reduce_scalar(local_pi, ReduceOp::Sum, ROOT)?;
    let pi_sq_sum = world.reduce_scalar(local_pi * local_pi, ReduceOp::Sum, ROOT)?;
    let inside_total = world.reduce_scalar(inside, ReduceOp::Sum, ROOT)?;

    world.barrier()?;
    let elapsed = Mpi::wtime() - start;

    if let (Some(pi_sum), Some(pi_sq_sum), Some(inside_total)) = (pi_sum, pi_sq_sum, inside_total)
    {
        let spread = Spread::from_sums(pi_sum, pi_sq_sum, size);
        let error = (spread.mean - PI).abs();

        println!();
        println!("=== RESULTS ===");
        println!("Parallel π estimate: {:.10}", spread.mean);
        println!("Pooled π estimate:   {:.10}", estimate(inside_total, total));
        println!("Actual π value:      {PI:.10}");
        println!("Absolute error:      {error:.10}");
        println!("Relative error:      {:.6}%", error / PI * 100.0);

        println!();
        println!("=== STATISTICS ===");
        println!("Mean across processes:     {:.8}", spread.mean);
        println!("Standard deviation:        {:.8}", spread.std_dev);
        println!(
            "Coefficient of variation:  {:.4}%",
            spread.coefficient_of_variation()
        );

        println!();
        println!("=== PERFORMANCE ===");
        println!("Total execution time:      {elapsed:.4} seconds");
        println!(
            "Samples per second:        {:.0}",
            total as f64 / elapsed
        );
        println!(
            "Time per million samples:  {:.4} seconds",
            elapsed / (total as f64 / 1_000_000.0)
        );

        let expected = theoretical_error(total);
        println!();
        println!("=== THEORETICAL ANALYSIS ===");
        println!("Theoretical standard error: {expected:.8}");
        println!(
            "Observed vs theoretical:    {:.2}x",
            spread.std_dev / expected
        );
    }
    Ok(())
}
