//! Whole-group runs of the greeter on an in-process group.

use hellompi::logging::init_logging_with_level;
use hellompi::{
    Error, Greeter, GreeterConfig, LocalGroup, Outcome, Payload, Transport, GREETING_MESSAGE,
};

struct RankReport {
    rank: i32,
    size: i32,
    outcome: Outcome,
    lines: Vec<String>,
}

fn run_group(size: i32) -> Vec<RankReport> {
    init_logging_with_level(0, log::LevelFilter::Trace);
    let greeter = Greeter::new(GreeterConfig::default());
    LocalGroup::new(size)
        .unwrap()
        .with_host_name("cluster-node")
        .run(|member| {
            let mut out = Vec::<u8>::new();
            let outcome = greeter.run(&member, &mut out).unwrap();
            RankReport {
                rank: member.rank(),
                size: member.size(),
                outcome,
                lines: String::from_utf8(out)
                    .unwrap()
                    .lines()
                    .map(str::to_string)
                    .collect(),
            }
        })
}

#[test]
fn every_rank_reports_a_unique_identity() {
    for size in 1..=6 {
        let reports = run_group(size);
        let ranks: Vec<i32> = reports.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (0..size).collect::<Vec<_>>());
        assert!(reports.iter().all(|r| r.size == size));
        assert_eq!(
            reports.iter().filter(|r| r.rank == 0).count(),
            1,
            "exactly one root in a group of {size}"
        );
    }
}

#[test]
fn each_greeting_appears_once() {
    let reports = run_group(5);
    let all_lines: Vec<&String> = reports.iter().flat_map(|r| &r.lines).collect();
    for rank in 0..5 {
        let greeting =
            format!("Hello world from processor cluster-node, rank {rank} out of 5 processors");
        assert_eq!(
            all_lines.iter().filter(|line| ***line == greeting).count(),
            1,
            "greeting of rank {rank}"
        );
    }
}

#[test]
fn four_processes_scenario() {
    let reports = run_group(4);
    let all_lines: Vec<&String> = reports.iter().flat_map(|r| &r.lines).collect();

    let sent: Vec<_> = all_lines
        .iter()
        .filter(|line| line.ends_with("Sent data to all other processes"))
        .collect();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].as_str(), "Rank 0: Sent data to all other processes");

    for rank in 1..4 {
        let expected = format!("Rank {rank}: Received data: Hello from rank 0!");
        assert_eq!(reports[rank as usize].lines[1], expected);
    }
    assert_eq!(
        all_lines
            .iter()
            .filter(|line| line.contains("Received data: Hello from rank 0!"))
            .count(),
        3
    );
    assert_eq!(
        reports[0].outcome,
        Outcome::Sent {
            recipients: vec![1, 2, 3]
        }
    );
}

#[test]
fn payload_arrives_unchanged() {
    for report in run_group(4).into_iter().skip(1) {
        match report.outcome {
            Outcome::Received(payload) => {
                assert_eq!(payload.message, GREETING_MESSAGE);
                assert!(!payload.message.is_empty());
                assert_eq!(payload.numbers, vec![1, 2, 3, 4, 5]);
                assert_eq!(payload, Payload::greeting());
            }
            other => panic!("rank {} did not receive: {other:?}", report.rank),
        }
    }
}

#[test]
fn single_process_sends_nothing() {
    let reports = run_group(1);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, Outcome::Sent { recipients: vec![] });
    assert_eq!(
        reports[0].lines,
        vec![
            "Hello world from processor cluster-node, rank 0 out of 1 processors".to_string(),
            "Rank 0: Sent data to all other processes".to_string(),
        ]
    );
}

#[test]
fn receivers_ignore_unrelated_traffic() {
    // Rank 2 pokes rank 1 with a different tag before the payload goes out;
    // rank 1 must still match the payload by source and tag.
    let greeter = Greeter::new(GreeterConfig::default());
    let outcomes = LocalGroup::new(3).unwrap().run(|member| {
        if member.rank() == 2 {
            member.send_bytes(b"noise", 1, 3).unwrap();
        }
        let outcome = greeter.run(&member, &mut std::io::sink()).unwrap();
        if member.rank() == 1 {
            assert_eq!(member.recv_bytes(2, 3).unwrap(), b"noise");
        }
        outcome
    });
    assert_eq!(outcomes[1], Outcome::Received(Payload::greeting()));
}

#[test]
fn negative_root_fails_on_every_rank() {
    // No member equals root -1, so without validation every one would block
    // in its receive.
    let greeter = Greeter::new(GreeterConfig { root: -1, tag: 11 });
    let results = LocalGroup::new(3).unwrap().run(|member| {
        let mut out = Vec::<u8>::new();
        let result = greeter.run(&member, &mut out);
        (result, out)
    });
    for (rank, (result, out)) in results.into_iter().enumerate() {
        assert!(
            matches!(result, Err(Error::Config(_))),
            "rank {rank}: {result:?}"
        );
        assert!(out.is_empty());
    }
}

#[test]
fn custom_payload_goes_through_the_codec() {
    let payload = Payload::new("checkpoint", vec![-7, 0, i64::MAX]);
    let received = LocalGroup::new(2).unwrap().run(|member| {
        if member.rank() == 0 {
            member.send_payload(&payload, 1, 5).unwrap();
            None
        } else {
            Some(member.recv_payload(0, 5).unwrap())
        }
    });
    assert_eq!(received[1].as_ref(), Some(&payload));
}
