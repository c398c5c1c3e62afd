//! In-process group of cooperating members.
//!
//! Each member is a [`LocalEndpoint`] with its own inbox; members normally run
//! on separate threads (see [`LocalGroup::run`]). Messages are matched by
//! `(source, tag)` like MPI: an arrival that does not match the posted receive
//! is parked and considered first by later receives, and messages between one
//! pair of members with the same tag are never reordered.

use crate::error::{Error, Result};
use crate::transport::Transport;
use log::trace;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

/// Host name reported by local members unless overridden.
pub const DEFAULT_LOCAL_HOST: &str = "localhost";

struct Envelope {
    source: i32,
    tag: i32,
    bytes: Vec<u8>,
}

impl Envelope {
    fn matches(&self, source: i32, tag: i32) -> bool {
        (source == -1 || self.source == source) && (tag == -1 || self.tag == tag)
    }
}

/// Builder for an in-process group.
///
/// # Example
///
/// ```
/// use hellompi::{LocalGroup, Transport};
///
/// let ranks = LocalGroup::new(3).unwrap().run(|member| member.rank());
/// assert_eq!(ranks, vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct LocalGroup {
    size: i32,
    host_name: String,
}

impl LocalGroup {
    /// A group of `size` members. `size` must be at least 1.
    pub fn new(size: i32) -> Result<Self> {
        if size < 1 {
            return Err(Error::InvalidCount(i64::from(size)));
        }
        Ok(LocalGroup {
            size,
            host_name: DEFAULT_LOCAL_HOST.to_string(),
        })
    }

    /// Override the host name every member reports.
    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = host_name.into();
        self
    }

    /// Number of members.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Create the connected endpoints, indexed by rank.
    pub fn endpoints(&self) -> Vec<LocalEndpoint> {
        let (senders, inboxes): (Vec<Sender<Envelope>>, Vec<Receiver<Envelope>>) =
            (0..self.size).map(|_| channel()).unzip();

        inboxes
            .into_iter()
            .enumerate()
            .map(|(index, inbox)| {
                let rank = index as i32;
                // No channel to self: self-sends are parked directly, so the
                // inbox disconnects once every other member is gone.
                let peers = senders
                    .iter()
                    .enumerate()
                    .map(|(peer, tx)| (peer != index).then(|| tx.clone()))
                    .collect();
                LocalEndpoint {
                    rank,
                    size: self.size,
                    host_name: self.host_name.clone(),
                    peers,
                    inbox,
                    parked: RefCell::new(VecDeque::new()),
                }
            })
            .collect()
    }

    /// Run `f` once per member, each on its own thread, and collect the
    /// results in rank order. A panic in any member is propagated.
    pub fn run<F, R>(&self, f: F) -> Vec<R>
    where
        F: Fn(LocalEndpoint) -> R + Sync,
        R: Send,
    {
        let endpoints = self.endpoints();
        let f = &f;
        thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|endpoint| scope.spawn(move || f(endpoint)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

/// One member of a [`LocalGroup`].
pub struct LocalEndpoint {
    rank: i32,
    size: i32,
    host_name: String,
    peers: Vec<Option<Sender<Envelope>>>,
    inbox: Receiver<Envelope>,
    parked: RefCell<VecDeque<Envelope>>,
}

impl LocalEndpoint {
    fn check_rank(&self, rank: i32) -> Result<()> {
        if rank < 0 || rank >= self.size {
            return Err(Error::InvalidRank(rank));
        }
        Ok(())
    }

    fn take_parked(&self, source: i32, tag: i32) -> Option<Envelope> {
        let mut parked = self.parked.borrow_mut();
        let index = parked.iter().position(|env| env.matches(source, tag))?;
        parked.remove(index)
    }
}

impl Transport for LocalEndpoint {
    fn rank(&self) -> i32 {
        self.rank
    }

    fn size(&self) -> i32 {
        self.size
    }

    fn host_name(&self) -> Result<String> {
        Ok(self.host_name.clone())
    }

    fn send_bytes(&self, bytes: &[u8], dest: i32, tag: i32) -> Result<()> {
        self.check_rank(dest)?;
        let envelope = Envelope {
            source: self.rank,
            tag,
            bytes: bytes.to_vec(),
        };
        trace!(
            "local rank {} -> {} (tag {}, {} bytes)",
            self.rank,
            dest,
            tag,
            bytes.len()
        );
        match &self.peers[dest as usize] {
            Some(tx) => tx.send(envelope).map_err(|_| Error::Disconnected(dest)),
            None => {
                self.parked.borrow_mut().push_back(envelope);
                Ok(())
            }
        }
    }

    fn recv_bytes(&self, source: i32, tag: i32) -> Result<Vec<u8>> {
        if source != -1 {
            self.check_rank(source)?;
        }
        if let Some(envelope) = self.take_parked(source, tag) {
            return Ok(envelope.bytes);
        }
        loop {
            let envelope = self
                .inbox
                .recv()
                .map_err(|_| Error::Disconnected(source))?;
            if envelope.matches(source, tag) {
                trace!(
                    "local rank {} <- {} (tag {}, {} bytes)",
                    self.rank,
                    envelope.source,
                    envelope.tag,
                    envelope.bytes.len()
                );
                return Ok(envelope.bytes);
            }
            self.parked.borrow_mut().push_back(envelope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_group() {
        assert!(matches!(LocalGroup::new(0), Err(Error::InvalidCount(0))));
    }

    #[test]
    fn endpoints_report_identity() {
        let group = LocalGroup::new(3).unwrap().with_host_name("node07");
        for (index, endpoint) in group.endpoints().iter().enumerate() {
            assert_eq!(endpoint.rank(), index as i32);
            assert_eq!(endpoint.size(), 3);
            assert_eq!(endpoint.host_name().unwrap(), "node07");
        }
    }

    #[test]
    fn out_of_order_tags_are_parked() {
        let endpoints = LocalGroup::new(2).unwrap().endpoints();
        let (a, b) = (&endpoints[0], &endpoints[1]);
        a.send_bytes(b"first", 1, 5).unwrap();
        a.send_bytes(b"second", 1, 6).unwrap();

        assert_eq!(b.recv_bytes(0, 6).unwrap(), b"second");
        assert_eq!(b.recv_bytes(0, 5).unwrap(), b"first");
    }

    #[test]
    fn same_tag_is_not_overtaken() {
        let endpoints = LocalGroup::new(2).unwrap().endpoints();
        for i in 0u8..4 {
            endpoints[1].send_bytes(&[i], 0, 1).unwrap();
        }
        for i in 0u8..4 {
            assert_eq!(endpoints[0].recv_bytes(1, 1).unwrap(), vec![i]);
        }
    }

    #[test]
    fn self_send_is_delivered() {
        let endpoints = LocalGroup::new(1).unwrap().endpoints();
        endpoints[0].send_bytes(b"loop", 0, 3).unwrap();
        assert_eq!(endpoints[0].recv_bytes(0, 3).unwrap(), b"loop");
    }

    #[test]
    fn invalid_ranks_are_rejected() {
        let endpoints = LocalGroup::new(2).unwrap().endpoints();
        assert!(matches!(
            endpoints[0].send_bytes(b"x", 2, 0),
            Err(Error::InvalidRank(2))
        ));
        assert!(matches!(
            endpoints[0].recv_bytes(-3, 0),
            Err(Error::InvalidRank(-3))
        ));
    }

    #[test]
    fn receive_from_departed_peers_fails() {
        let mut endpoints = LocalGroup::new(2).unwrap().endpoints();
        let survivor = endpoints.remove(0);
        drop(endpoints);
        assert!(matches!(
            survivor.recv_bytes(1, 0),
            Err(Error::Disconnected(1))
        ));
    }

    #[test]
    fn run_collects_in_rank_order() {
        let hosts = LocalGroup::new(4)
            .unwrap()
            .run(|member| (member.rank(), member.size()));
        assert_eq!(hosts, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
    }
}
