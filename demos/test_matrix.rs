//! Integration test for the variable-count collectives and the distributed
//! matrix product.
//!
//! Exercises `broadcast`, `scatterv` and `gatherv` with uneven row blocks and
//! checks the gathered product against a serial multiplication at the root.
//!
//! Run with: mpiexec -n 3 ./target/debug/examples/test_matrix

use hellompi::matrix::{multiply_rows, Matrix, RowLayout};
use hellompi::Mpi;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    let mpi = Mpi::init().expect("MPI init failed");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let rank = world.rank();
    let size = world.size();

    // ========================================================================
    // Test 1: scatterv/gatherv round trip with uneven blocks
    // ========================================================================
    {
        // Rank r owns r + 1 elements, each equal to r
        let counts: Vec<i32> = (1..=size).collect();
        let displs: Vec<i32> = counts
            .iter()
            .scan(0, |acc, &c| {
                let d = *acc;
                *acc += c;
                Some(d)
            })
            .collect();
        let total = counts.iter().sum::<i32>() as usize;

        let send: Vec<i32> = if rank == 0 {
            (0..size)
                .flat_map(|r| std::iter::repeat(r).take(r as usize + 1))
                .collect()
        } else {
            Vec::new()
        };
        let mut piece = vec![-1i32; rank as usize + 1];
        world
            .scatterv(&send, &counts, &displs, &mut piece, 0)
            .expect("scatterv failed");
        assert!(piece.iter().all(|&v| v == rank), "rank {rank} got {piece:?}");

        let mut back = if rank == 0 { vec![-1i32; total] } else { Vec::new() };
        world
            .gatherv(&piece, &mut back, &counts, &displs, 0)
            .expect("gatherv failed");
        if rank == 0 {
            assert_eq!(back, send);
            println!("PASS: scatterv/gatherv");
        }
    }

    // ========================================================================
    // Test 2: layout that does not cover the buffer is rejected at the root
    // ========================================================================
    {
        if rank == 0 {
            let counts = vec![4; size as usize];
            let displs: Vec<i32> = (0..size).map(|r| r * 4).collect();
            let mut recv = vec![0.0f64; 1];
            let err = world
                .gatherv(&[0.0f64; 4], &mut recv, &counts, &displs, 0)
                .expect_err("gatherv into a short buffer must fail");
            assert!(matches!(err, hellompi::Error::InvalidCount(_)));
            println!("PASS: gatherv layout check");
        }
        world.barrier().expect("barrier after layout check failed");
    }

    // ========================================================================
    // Test 3: distributed product equals the serial one
    // ========================================================================
    for n in [1, 7, 64] {
        let layout = RowLayout::new(n, size).expect("row layout failed");
        let (a, b) = if rank == 0 {
            (
                Some(Matrix::random(n, n, &mut StdRng::seed_from_u64(11))),
                Some(Matrix::random(n, n, &mut StdRng::seed_from_u64(12))),
            )
        } else {
            (None, None)
        };

        let mut local_a = vec![0.0; layout.counts[rank as usize] as usize];
        let a_data = a.as_ref().map_or(&[][..], Matrix::as_slice);
        world
            .scatterv(a_data, &layout.counts, &layout.displs, &mut local_a, 0)
            .expect("scatterv of A failed");

        let mut b_data = b
            .as_ref()
            .map_or_else(|| vec![0.0; n * n], |b| b.as_slice().to_vec());
        world.broadcast(&mut b_data, 0).expect("broadcast of B failed");

        let local_c = multiply_rows(&local_a, &b_data, n, n);
        assert_eq!(local_c.len(), layout.rows_of(rank, n) * n);

        let mut c = if rank == 0 { vec![0.0; n * n] } else { Vec::new() };
        world
            .gatherv(&local_c, &mut c, &layout.counts, &layout.displs, 0)
            .expect("gatherv of C failed");

        if let (Some(a), Some(b)) = (a, b) {
            let serial = a.multiply(&b).expect("serial product failed");
            assert_eq!(c, serial.as_slice(), "product of size {n}");
            println!("PASS: distributed product (n = {n})");
        }
    }

    world.barrier().expect("final barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All matrix tests passed!");
        println!("========================================");
    }
}
