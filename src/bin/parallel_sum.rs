//! Parallel sum - each rank adds its block of 1..=N, rank 0 collects the total.
//!
//! Run with: mpiexec -n 4 ./target/debug/parallel_sum [N]

use hellompi::logging::init_logging;
use hellompi::sum::{expected_total, parse_total, Block};
use hellompi::{Communicator, Mpi, ReduceOp, Result};
use std::process::ExitCode;

const ROOT: i32 = 0;

fn main() -> ExitCode {
    let mpi = match Mpi::init() {
        Ok(mpi) => mpi,
        Err(e) => {
            eprintln!("parallel_sum: failed to join the MPI group: {e}");
            return ExitCode::FAILURE;
        }
    };
    let world = mpi.world();
    init_logging(world.rank());

    let arg = std::env::args().nth(1);
    if let Err(e) = run(&world, arg.as_deref()) {
        eprintln!("parallel_sum: rank {}: {e}", world.rank());
        world.abort(1);
    }

    drop(mpi);
    ExitCode::SUCCESS
}

fn run(world: &Communicator, arg: Option<&str>) -> Result<()> {
    let rank = world.rank();
    let size = world.size();
    let total = parse_total(arg)?;

    world.barrier()?;
    let start = Mpi::wtime();
    let block = Block::for_rank(total, rank, size)?;
    let local_sum = block.sum();
    println!(
        "Process {rank}: calculated local sum = {local_sum} (elements {} to {})",
        block.first, block.last
    );

    let global_sum = world.reduce_scalar(local_sum, ReduceOp::Sum, ROOT)?;
    log::debug!("reduction finished in {:.6}s", Mpi::wtime() - start);

    if let Some(global_sum) = global_sum {
        println!();
        println!("=== RESULTS ===");
        println!("Parallel sum of numbers 1 to {total} = {global_sum}");
        // parse_total already capped `total`, so the closed form fits
        if let Some(expected) = expected_total(total) {
            println!("Expected sum (formula n*(n+1)/2) = {expected}");
        }
        println!("Number of processes used: {size}");
    }
    Ok(())
}
