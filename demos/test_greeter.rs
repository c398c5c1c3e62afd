//! Integration test for the greeter and the MPI transport.
//!
//! Exercises the lifecycle queries, `Greeter::run` on `MPI_COMM_WORLD`, and
//! the `Transport` implementation of `Communicator` (probe-sized receives,
//! payload helpers, wildcard sources).
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_greeter

use hellompi::{
    greeting_line, Greeter, GreeterConfig, Mpi, Outcome, Payload, ReduceOp, Transport,
    GREETING_MESSAGE,
};

fn main() {
    let mpi = Mpi::init().expect("MPI init failed");

    // A failed assertion on one rank would leave the others blocked in a
    // receive or collective.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let rank = world.rank();
    let size = world.size();

    // ========================================================================
    // Test 1: lifecycle
    // ========================================================================
    {
        assert!(Mpi::is_initialized(), "is_initialized should be true after init");
        assert!(!Mpi::is_finalized(), "is_finalized should be false before drop");
        assert!(world.raw_handle() >= 0, "raw_handle should be non-negative");
        assert!(rank >= 0 && rank < size, "rank {rank} outside 0..{size}");
        if rank == 0 {
            println!("PASS: lifecycle");
        }
    }

    // ========================================================================
    // Test 2: identity is unique and the size agrees everywhere
    // ========================================================================
    {
        let members = world
            .reduce_scalar(1i32, ReduceOp::Sum, 0)
            .expect("reduce member count failed");
        let rank_sum = world
            .reduce_scalar(i64::from(rank), ReduceOp::Sum, 0)
            .expect("reduce rank sum failed");
        let max_rank = world
            .reduce_scalar(rank, ReduceOp::Max, 0)
            .expect("reduce max rank failed");
        let min_size = world
            .reduce_scalar(size, ReduceOp::Min, 0)
            .expect("reduce min size failed");

        if rank == 0 {
            let n = i64::from(size);
            assert_eq!(members, Some(size), "every rank reports exactly once");
            assert_eq!(rank_sum, Some(n * (n - 1) / 2), "ranks are 0..size");
            assert_eq!(max_rank, Some(size - 1));
            assert_eq!(min_size, Some(size), "all ranks agree on the size");
            println!("PASS: identity");
        } else {
            assert_eq!(members, None, "reduce_scalar is None off the root");
        }
    }

    // ========================================================================
    // Test 3: greeter on the world communicator
    // ========================================================================
    {
        let greeter = Greeter::new(GreeterConfig::default());
        let mut out = Vec::<u8>::new();
        let outcome = greeter.run(&world, &mut out).expect("greeter run failed");
        let text = String::from_utf8(out).expect("greeter wrote invalid UTF-8");
        let lines: Vec<&str> = text.lines().collect();

        let host = world.processor_name().expect("processor_name failed");
        assert!(!host.is_empty(), "processor_name should not be empty");
        assert_eq!(lines.len(), 2, "rank {rank}: {lines:?}");
        assert_eq!(lines[0], greeting_line(&host, rank, size));

        let received = match outcome {
            Outcome::Sent { recipients } => {
                assert_eq!(rank, 0, "only the root sends");
                assert_eq!(recipients, (1..size).collect::<Vec<_>>());
                assert_eq!(lines[1], "Rank 0: Sent data to all other processes");
                0i32
            }
            Outcome::Received(payload) => {
                assert_ne!(rank, 0, "the root never receives");
                assert_eq!(payload.message, GREETING_MESSAGE);
                assert_eq!(payload.numbers, vec![1, 2, 3, 4, 5]);
                assert_eq!(
                    lines[1],
                    format!("Rank {rank}: Received data: Hello from rank 0!")
                );
                1
            }
        };

        let receivers = world
            .reduce_scalar(received, ReduceOp::Sum, 0)
            .expect("reduce receiver count failed");
        if rank == 0 {
            assert_eq!(receivers, Some(size - 1), "every other rank received");
            println!("PASS: greeter ({} receivers)", size - 1);
        }
    }

    world.barrier().expect("barrier after greeter failed");

    if size >= 2 {
        // ====================================================================
        // Test 4: payload helpers around a ring
        // ====================================================================
        {
            let tag = 21;
            let next = (rank + 1) % size;
            let prev = (rank + size - 1) % size;
            let payload = Payload::new(format!("from {rank}"), vec![i64::from(rank); 3]);

            // Even ranks send first so the blocking sends cannot deadlock
            let got = if rank % 2 == 0 {
                world.send_payload(&payload, next, tag).expect("send_payload failed");
                world.recv_payload(prev, tag).expect("recv_payload failed")
            } else {
                let got = world.recv_payload(prev, tag).expect("recv_payload failed");
                world.send_payload(&payload, next, tag).expect("send_payload failed");
                got
            };
            assert_eq!(got, Payload::new(format!("from {prev}"), vec![i64::from(prev); 3]));

            world.barrier().expect("barrier after ring failed");
            if rank == 0 {
                println!("PASS: send_payload/recv_payload ring");
            }
        }

        // ====================================================================
        // Test 5: probe-sized receive from any source
        // ====================================================================
        {
            let tag = 22;
            if rank == 0 {
                let mut seen = Vec::new();
                for _ in 1..size {
                    let (data, status) = world
                        .recv_vec::<i32>(-1, tag)
                        .expect("recv_vec from any source failed");
                    assert!(status.matches(-1, tag));
                    assert_eq!(status.count, i64::from(status.source) + 1);
                    assert!(data.iter().all(|&v| v == status.source));
                    seen.push(status.source);
                }
                seen.sort_unstable();
                assert_eq!(seen, (1..size).collect::<Vec<_>>());
                println!("PASS: recv_vec (any source)");
            } else {
                // Rank r sends r + 1 copies of r, so every length differs
                let data = vec![rank; rank as usize + 1];
                world.send(&data, 0, tag).expect("send to root failed");
            }
        }

        // ====================================================================
        // Test 6: invalid destination is rejected before reaching MPI
        // ====================================================================
        {
            let err = world
                .send_bytes(b"x", size, 23)
                .expect_err("send to rank == size must fail");
            assert!(matches!(err, hellompi::Error::InvalidRank(r) if r == size));
            if rank == 0 {
                println!("PASS: invalid destination");
            }
        }
    }

    world.barrier().expect("final barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All greeter tests passed!");
        println!("========================================");
    }
}
