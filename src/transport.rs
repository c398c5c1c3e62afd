//! Point-to-point operations the greeter relies on.
//!
//! [`Communicator`] implements [`Transport`] on top of MPI. The in-process
//! [`LocalGroup`](crate::LocalGroup) implements it with channels so the
//! greeter can run without a launcher.

use crate::comm::Communicator;
use crate::error::Result;
use crate::payload::Payload;

/// A member of a group of cooperating processes.
pub trait Transport {
    /// This member's rank, `0 <= rank < size`.
    fn rank(&self) -> i32;

    /// Number of members in the group.
    fn size(&self) -> i32;

    /// Name of the machine this member runs on.
    fn host_name(&self) -> Result<String>;

    /// Send an encoded message to `dest`.
    fn send_bytes(&self, bytes: &[u8], dest: i32, tag: i32) -> Result<()>;

    /// Block until the message from `source` with `tag` arrives and return it.
    fn recv_bytes(&self, source: i32, tag: i32) -> Result<Vec<u8>>;

    /// Encode and send a payload.
    fn send_payload(&self, payload: &Payload, dest: i32, tag: i32) -> Result<()> {
        self.send_bytes(&payload.encode()?, dest, tag)
    }

    /// Receive and decode a payload.
    fn recv_payload(&self, source: i32, tag: i32) -> Result<Payload> {
        Payload::decode(&self.recv_bytes(source, tag)?)
    }
}

impl Transport for Communicator {
    fn rank(&self) -> i32 {
        Communicator::rank(self)
    }

    fn size(&self) -> i32 {
        Communicator::size(self)
    }

    fn host_name(&self) -> Result<String> {
        self.processor_name()
    }

    fn send_bytes(&self, bytes: &[u8], dest: i32, tag: i32) -> Result<()> {
        self.send(bytes, dest, tag)
    }

    fn recv_bytes(&self, source: i32, tag: i32) -> Result<Vec<u8>> {
        // recv_vec pins the receive to the probed envelope
        let (bytes, _status) = self.recv_vec::<u8>(source, tag)?;
        Ok(bytes)
    }
}
