//! The greeting demo: report identity, then distribute one payload from the
//! root to every other rank.

use crate::config::GreeterConfig;
use crate::error::Result;
use crate::payload::Payload;
use crate::transport::Transport;
use log::{debug, info};
use std::io::Write;

/// What this rank did after greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The root sent the payload to these ranks, in send order.
    Sent {
        /// Destination ranks.
        recipients: Vec<i32>,
    },
    /// A non-root rank received this payload.
    Received(Payload),
}

/// Runs the greeting demo on one member of a group.
///
/// # Example
///
/// ```
/// use hellompi::{Greeter, GreeterConfig, LocalGroup, Outcome};
///
/// let greeter = Greeter::new(GreeterConfig::default());
/// let outcomes = LocalGroup::new(2)
///     .unwrap()
///     .run(|member| greeter.run(&member, &mut std::io::sink()).unwrap());
/// assert_eq!(outcomes[0], Outcome::Sent { recipients: vec![1] });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Greeter {
    config: GreeterConfig,
}

impl Greeter {
    /// Create a greeter with the given settings.
    pub fn new(config: GreeterConfig) -> Self {
        Greeter { config }
    }

    /// Settings in use.
    pub fn config(&self) -> &GreeterConfig {
        &self.config
    }

    /// Greet, then send (root) or receive (everyone else).
    ///
    /// Writes one greeting line and one status line to `out`. Blocks on
    /// non-root ranks until the payload arrives.
    pub fn run<T, W>(&self, transport: &T, out: &mut W) -> Result<Outcome>
    where
        T: Transport + ?Sized,
        W: Write,
    {
        let rank = transport.rank();
        let size = transport.size();
        self.config.validate(size)?;

        let host = transport.host_name()?;
        writeln!(out, "{}", greeting_line(&host, rank, size))?;
        out.flush()?;

        if rank == self.config.root {
            let recipients = self.distribute(transport)?;
            writeln!(out, "Rank {rank}: Sent data to all other processes")?;
            out.flush()?;
            Ok(Outcome::Sent { recipients })
        } else {
            let payload = transport.recv_payload(self.config.root, self.config.tag)?;
            debug!(
                "rank {rank}: payload from rank {} carries {} numbers",
                self.config.root,
                payload.numbers.len()
            );
            writeln!(out, "Rank {rank}: Received data: {}", payload.message)?;
            out.flush()?;
            Ok(Outcome::Received(payload))
        }
    }

    fn distribute<T>(&self, transport: &T) -> Result<Vec<i32>>
    where
        T: Transport + ?Sized,
    {
        let root = self.config.root;
        let bytes = Payload::greeting_from(root).encode()?;
        let recipients: Vec<i32> = (0..transport.size()).filter(|&r| r != root).collect();

        for &dest in &recipients {
            transport.send_bytes(&bytes, dest, self.config.tag)?;
            debug!(
                "rank {root}: sent {} bytes to rank {dest} (tag {})",
                bytes.len(),
                self.config.tag
            );
        }
        info!("rank {root}: payload delivered to {} ranks", recipients.len());
        Ok(recipients)
    }
}

/// The line every rank prints on startup.
pub fn greeting_line(host: &str, rank: i32, size: i32) -> String {
    format!("Hello world from processor {host}, rank {rank} out of {size} processors")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, LocalGroup};

    fn run_group(size: i32, config: GreeterConfig) -> Vec<(Outcome, String)> {
        let greeter = Greeter::new(config);
        LocalGroup::new(size)
            .unwrap()
            .with_host_name("testhost")
            .run(|member| {
                let mut out = Vec::<u8>::new();
                let outcome = greeter.run(&member, &mut out).unwrap();
                (outcome, String::from_utf8(out).unwrap())
            })
    }

    #[test]
    fn greeting_line_format() {
        assert_eq!(
            greeting_line("node1", 2, 4),
            "Hello world from processor node1, rank 2 out of 4 processors"
        );
    }

    #[test]
    fn root_output() {
        let results = run_group(3, GreeterConfig::default());
        assert_eq!(
            results[0].1,
            "Hello world from processor testhost, rank 0 out of 3 processors\n\
             Rank 0: Sent data to all other processes\n"
        );
        assert_eq!(results[0].0, Outcome::Sent { recipients: vec![1, 2] });
    }

    #[test]
    fn receiver_output() {
        let results = run_group(3, GreeterConfig::default());
        assert_eq!(
            results[2].1,
            "Hello world from processor testhost, rank 2 out of 3 processors\n\
             Rank 2: Received data: Hello from rank 0!\n"
        );
    }

    #[test]
    fn alternate_root_and_tag() {
        let results = run_group(3, GreeterConfig { root: 1, tag: 99 });
        assert_eq!(results[1].0, Outcome::Sent { recipients: vec![0, 2] });
        for index in [0, 2] {
            match &results[index].0 {
                Outcome::Received(payload) => {
                    assert_eq!(payload.message, "Hello from rank 1!");
                }
                other => panic!("rank {index} should have received, got {other:?}"),
            }
        }
    }

    #[test]
    fn root_outside_group_is_rejected() {
        let greeter = Greeter::new(GreeterConfig { root: 2, tag: 11 });
        let endpoints = LocalGroup::new(2).unwrap().endpoints();
        let mut out = Vec::<u8>::new();
        let err = greeter.run(&endpoints[0], &mut out).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(out.is_empty(), "nothing is printed before validation");
    }
}
