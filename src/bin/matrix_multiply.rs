//! Matrix multiplication - rank 0 scatters row blocks of A and broadcasts B,
//! every rank multiplies its block, rank 0 gathers C = A x B.
//!
//! Run with: mpiexec -n 4 ./target/release/matrix_multiply [N] [SEED]

use hellompi::logging::init_logging;
use hellompi::matrix::{multiply_rows, parse_dimension, Matrix, RowLayout};
use hellompi::{parse_seed, Communicator, Mpi, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::process::ExitCode;

const ROOT: i32 = 0;

fn main() -> ExitCode {
    let mpi = match Mpi::init() {
        Ok(mpi) => mpi,
        Err(e) => {
            eprintln!("matrix_multiply: failed to join the MPI group: {e}");
            return ExitCode::FAILURE;
        }
    };
    let world = mpi.world();
    init_logging(world.rank());

    let mut args = std::env::args().skip(1);
    let (dimension_arg, seed_arg) = (args.next(), args.next());
    if let Err(e) = run(&world, dimension_arg.as_deref(), seed_arg.as_deref()) {
        eprintln!("matrix_multiply: rank {}: {e}", world.rank());
        world.abort(1);
    }

    drop(mpi);
    ExitCode::SUCCESS
}

fn run(world: &Communicator, dimension_arg: Option<&str>, seed_arg: Option<&str>) -> Result<()> {
    let rank = world.rank();
    let size = world.size();
    let n = parse_dimension(dimension_arg)?;
    let layout = RowLayout::new(n, size)?;

    // A and B only exist at the root until they are distributed
    let (a, b) = if rank == ROOT {
        let seed = parse_seed(seed_arg)?;
        log::debug!("matrix seed {seed}");
        let a = Matrix::random(n, n, &mut StdRng::seed_from_u64(seed));
        let b = Matrix::random(n, n, &mut StdRng::seed_from_u64(seed.wrapping_add(1)));

        println!("=== MPI Matrix Multiplication ===");
        println!("Matrix size: {n}x{n}");
        println!("Number of processes: {size}");
        println!(
            "Rows per process: {}-{}",
            layout.rows_of(size - 1, n),
            layout.rows_of(0, n)
        );
        println!();
        println!("Initialized matrices A and B");
        println!("\nMatrix A (sample):\n{}", a.preview());
        println!("Matrix B (sample):\n{}", b.preview());
        (Some(a), Some(b))
    } else {
        (None, None)
    };

    world.barrier()?;
    let start = Mpi::wtime();

    let mut local_a = vec![0.0; layout.counts[rank as usize] as usize];
    let a_data = a.as_ref().map_or(&[][..], Matrix::as_slice);
    world.scatterv(a_data, &layout.counts, &layout.displs, &mut local_a, ROOT)?;

    let mut b_data = b.map_or_else(|| vec![0.0; n * n], |b| b.as_slice().to_vec());
    world.broadcast(&mut b_data, ROOT)?;

    let local_c = multiply_rows(&local_a, &b_data, n, n);
    log::debug!("multiplied {} rows", layout.rows_of(rank, n));

    let mut c_data = if rank == ROOT {
        vec![0.0; n * n]
    } else {
        Vec::new()
    };
    world.gatherv(&local_c, &mut c_data, &layout.counts, &layout.displs, ROOT)?;

    world.barrier()?;
    let elapsed = Mpi::wtime() - start;

    if let Some(a) = a {
        let c = Matrix::from_vec(n, n, c_data)?;
        let b = Matrix::from_vec(n, n, b_data)?;
        let cubed = (n as f64).powi(3);

        println!("=== RESULTS ===");
        println!("\nResult Matrix C = A × B (sample):\n{}", c.preview());

        println!("=== PERFORMANCE ===");
        println!("Execution time: {elapsed:.4} seconds");
        println!("Operations: {cubed:.0} (matrix multiplications)");
        println!("GFLOPS: {:.2}", 2.0 * cubed / (elapsed * 1e9));

        println!(
            "Verification: C[0][0] = {:.6} (computed: {:.6})",
            c.get(0, 0),
            a.product_entry(&b, 0, 0)
        );
    }
    Ok(())
}
