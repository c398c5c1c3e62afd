//! Integration test for reductions and the parallel sum.
//!
//! Runs the block-partitioned sum for several totals (including the largest
//! accepted one) and checks the reduced result against the closed form, then
//! exercises `reduce` with every operation and the Monte Carlo reduction.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_reduce

use hellompi::pi::{count_inside, estimate, rank_seed, samples_for_rank};
use hellompi::sum::{expected_total, Block, MAX_TOTAL};
use hellompi::{Mpi, ReduceOp};
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
    // Test 1: parallel sum matches n*(n+1)/2
    // ========================================================================
    for total in [0, 1, 3, 1_000, 1_000_000, MAX_TOTAL] {
        let block = Block::for_rank(total, rank, size).expect("block split failed");
        let sum = world
            .reduce_scalar(block.sum(), ReduceOp::Sum, 0)
            .expect("reduce of local sums failed");
        let terms = world
            .reduce_scalar(block.len(), ReduceOp::Sum, 0)
            .expect("reduce of block lengths failed");

        if rank == 0 {
            assert_eq!(sum, expected_total(total), "sum of 1..={total}");
            assert_eq!(terms, Some(total), "blocks cover 1..={total} once");
            println!("PASS: parallel sum (n = {total})");
        } else {
            assert_eq!(sum, None);
        }
    }

    // ========================================================================
    // Test 2: element-wise reduce with every operation
    // ========================================================================
    {
        let send: Vec<i64> = (0..4).map(|i| i64::from(rank) + i).collect();
        let n = i64::from(size);
        for (op, expected) in [
            (ReduceOp::Sum, (0..4).map(|i| n * (n - 1) / 2 + n * i).collect::<Vec<_>>()),
            (ReduceOp::Max, (0..4).map(|i| n - 1 + i).collect()),
            (ReduceOp::Min, (0..4).collect()),
        ] {
            let mut recv = vec![0i64; send.len()];
            world.reduce(&send, &mut recv, op, 0).expect("reduce failed");
            if rank == 0 {
                assert_eq!(recv, expected, "{op:?}");
            }
        }

        let product = world
            .reduce_scalar(2.0f64, ReduceOp::Prod, 0)
            .expect("reduce Prod failed");
        if rank == 0 {
            assert_eq!(product, Some(2f64.powi(size)));
            println!("PASS: reduce Sum/Max/Min/Prod");
        }
    }

    // ========================================================================
    // Test 3: mismatched buffers and bad roots are rejected locally
    // ========================================================================
    {
        let mut short = [0u32; 1];
        assert!(world.reduce(&[1u32, 2], &mut short, ReduceOp::Sum, 0).is_err());
        assert!(world.reduce_scalar(1u32, ReduceOp::Sum, size).is_err());
        world.barrier().expect("barrier after rejections failed");
        if rank == 0 {
            println!("PASS: reduce argument checks");
        }
    }

    // ========================================================================
    // Test 4: Monte Carlo counts reduce to a pooled estimate
    // ========================================================================
    {
        let total = 400_000;
        let mut seed = [if rank == 0 { 2024u64 } else { 0 }];
        world.broadcast(&mut seed, 0).expect("broadcast seed failed");
        assert_eq!(seed[0], 2024, "rank {rank} did not get the root's seed");

        let local = samples_for_rank(total, rank, size).expect("sample split failed");
        let mut rng = StdRng::seed_from_u64(rank_seed(seed[0], rank));
        let inside = count_inside(&mut rng, local);
        let pooled = world
            .reduce_scalar(inside, ReduceOp::Sum, 0)
            .expect("reduce of hit counts failed");

        if let Some(pooled) = pooled {
            let pi = estimate(pooled, total);
            assert!(
                (pi - std::f64::consts::PI).abs() < 0.03,
                "pooled estimate {pi} too far from pi"
            );
            println!("PASS: Monte Carlo reduction (pi ~ {pi:.5})");
        }
    }

    world.barrier().expect("final barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All reduce tests passed!");
        println!("========================================");
    }
}
