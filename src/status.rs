//! Message envelope information.

/// Envelope of a probed or received message.
///
/// Returned by [`Communicator::probe`](crate::Communicator::probe) and
/// [`Communicator::recv`](crate::Communicator::recv).
///
/// # Example
///
/// ```no_run
/// # use hellompi::Mpi;
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// // Blocking probe for a byte message from rank 0 with tag 11
/// let status = world.probe::<u8>(0, 11).unwrap();
/// println!("{} bytes from rank {} (tag {})", status.count, status.source, status.tag);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Source rank of the message.
    pub source: i32,
    /// Tag of the message.
    pub tag: i32,
    /// Number of elements in the message (determined via `MPI_Get_count`).
    pub count: i64,
}

impl Status {
    /// Whether this envelope matches the requested source and tag.
    ///
    /// `-1` in either position acts as a wildcard.
    pub fn matches(&self, source: i32, tag: i32) -> bool {
        (source == -1 || self.source == source) && (tag == -1 || self.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_and_wildcard() {
        let status = Status {
            source: 0,
            tag: 11,
            count: 42,
        };
        assert!(status.matches(0, 11));
        assert!(status.matches(-1, 11));
        assert!(status.matches(0, -1));
        assert!(!status.matches(1, 11));
        assert!(!status.matches(0, 12));
    }
}
