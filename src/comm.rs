//! Safe wrappers for MPI communicator operations.

use crate::datatype::MpiDatatype;
use crate::error::{Error, Result};
use crate::ffi;
use crate::status::Status;
use crate::ReduceOp;
use std::marker::PhantomData;

/// Upper bound on `MPI_MAX_PROCESSOR_NAME` across MPICH and Open MPI.
const MAX_PROCESSOR_NAME: usize = 1024;

/// An MPI communicator.
///
/// This type wraps a communicator handle from the C shim and provides safe
/// point-to-point and collective operations. It is obtained from
/// [`Mpi::world`](crate::Mpi::world) and passed explicitly to everything that
/// communicates.
///
/// # Example
///
/// ```no_run
/// use hellompi::Mpi;
///
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// println!("I am rank {} of {}", world.rank(), world.size());
/// ```
#[derive(Clone)]
pub struct Communicator {
    handle: i32,
    /// Marker to prevent Send/Sync (MPI communicators are not thread-safe)
    _marker: PhantomData<*mut ()>,
}

impl Communicator {
    /// Get a handle to `MPI_COMM_WORLD`.
    pub(crate) fn world() -> Self {
        Communicator {
            handle: unsafe { ffi::hellompi_comm_world() },
            _marker: PhantomData,
        }
    }

    /// Get the raw communicator handle (for advanced use).
    pub fn raw_handle(&self) -> i32 {
        self.handle
    }

    /// Get the rank of the calling process in this communicator.
    pub fn rank(&self) -> i32 {
        let mut rank: i32 = 0;
        unsafe { ffi::hellompi_comm_rank(self.handle, &mut rank) };
        rank
    }

    /// Get the number of processes in this communicator.
    pub fn size(&self) -> i32 {
        let mut size: i32 = 0;
        unsafe { ffi::hellompi_comm_size(self.handle, &mut size) };
        size
    }

    /// Get the processor name for this process.
    ///
    /// MPICH and Open MPI report the machine's host name.
    pub fn processor_name(&self) -> Result<String> {
        let mut buf = [0u8; MAX_PROCESSOR_NAME];
        let mut len: i32 = 0;
        let ret = unsafe { ffi::hellompi_get_processor_name(buf.as_mut_ptr().cast(), &mut len) };
        Error::check(ret)?;
        let len = (len.max(0) as usize).min(buf.len());
        let s = std::str::from_utf8(&buf[..len])
            .map_err(|_| Error::Internal("Invalid UTF-8 in processor name".into()))?;
        Ok(s.to_string())
    }

    /// Terminate every process in this communicator with `errorcode`.
    ///
    /// Used when a rank fails so that peers blocked in a receive do not hang.
    pub fn abort(&self, errorcode: i32) -> ! {
        unsafe { ffi::hellompi_abort(self.handle, errorcode) };
        // MPI_Abort is not supposed to return; make sure this process goes away
        std::process::exit(errorcode)
    }

    fn check_rank(&self, rank: i32) -> Result<()> {
        if rank < 0 || rank >= self.size() {
            return Err(Error::InvalidRank(rank));
        }
        Ok(())
    }

    fn check_source(&self, source: i32) -> Result<()> {
        if source == ffi::ANY {
            return Ok(());
        }
        self.check_rank(source)
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Barrier synchronization.
    ///
    /// All processes in the communicator must call this function. No process
    /// will return until all processes have entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        let ret = unsafe { ffi::hellompi_barrier(self.handle) };
        Error::check(ret)
    }

    // ========================================================================
    // Point-to-Point Communication
    // ========================================================================

    /// Send a slice to `dest` with `tag` (blocking, standard mode).
    pub fn send<T: MpiDatatype>(&self, data: &[T], dest: i32, tag: i32) -> Result<()> {
        self.check_rank(dest)?;
        let ret = unsafe {
            ffi::hellompi_send(
                data.as_ptr().cast(),
                data.len() as i64,
                T::TAG as i32,
                dest,
                tag,
                self.handle,
            )
        };
        Error::check(ret)
    }

    /// Receive into `buf` from `source` with `tag`.
    ///
    /// Use `source = -1` for `MPI_ANY_SOURCE` and `tag = -1` for `MPI_ANY_TAG`.
    /// A message longer than `buf` fails with a truncation error.
    pub fn recv<T: MpiDatatype>(&self, buf: &mut [T], source: i32, tag: i32) -> Result<Status> {
        self.check_source(source)?;
        let mut actual_source: i32 = 0;
        let mut actual_tag: i32 = 0;
        let mut actual_count: i64 = 0;

        let ret = unsafe {
            ffi::hellompi_recv(
                buf.as_mut_ptr().cast(),
                buf.len() as i64,
                T::TAG as i32,
                source,
                tag,
                self.handle,
                &mut actual_source,
                &mut actual_tag,
                &mut actual_count,
            )
        };
        Error::check(ret)?;
        Ok(Status {
            source: actual_source,
            tag: actual_tag,
            count: actual_count,
        })
    }

    /// Block until a message matching `source`/`tag` is available, without
    /// receiving it. The count is expressed in elements of `T`.
    pub fn probe<T: MpiDatatype>(&self, source: i32, tag: i32) -> Result<Status> {
        self.check_source(source)?;
        let mut actual_source: i32 = 0;
        let mut actual_tag: i32 = 0;
        let mut actual_count: i64 = 0;

        let ret = unsafe {
            ffi::hellompi_probe(
                source,
                tag,
                T::TAG as i32,
                self.handle,
                &mut actual_source,
                &mut actual_tag,
                &mut actual_count,
            )
        };
        Error::check(ret)?;
        Ok(Status {
            source: actual_source,
            tag: actual_tag,
            count: actual_count,
        })
    }

    /// Receive a message whose length is not known in advance.
    ///
    /// Probes for the envelope, allocates a buffer of the reported size, then
    /// receives exactly that message (source and tag pinned to the probed
    /// envelope so a wildcard cannot match a different message in between).
    pub fn recv_vec<T: MpiDatatype>(&self, source: i32, tag: i32) -> Result<(Vec<T>, Status)> {
        let probed = self.probe::<T>(source, tag)?;
        let count = usize::try_from(probed.count).map_err(|_| Error::InvalidCount(probed.count))?;
        let mut buf = vec![T::default(); count];
        let status = self.recv(&mut buf, probed.source, probed.tag)?;
        buf.truncate(status.count.max(0) as usize);
        Ok((buf, status))
    }

    // ========================================================================
    // Collectives
    // ========================================================================

    /// Broadcast `data` from `root` to every process.
    ///
    /// `data` is input at the root and output everywhere else; every rank
    /// passes a buffer of the same length.
    pub fn broadcast<T: MpiDatatype>(&self, data: &mut [T], root: i32) -> Result<()> {
        self.check_rank(root)?;
        let ret = unsafe {
            ffi::hellompi_bcast(
                data.as_mut_ptr().cast(),
                data.len() as i64,
                T::TAG as i32,
                root,
                self.handle,
            )
        };
        Error::check(ret)
    }

    /// Scatter variable-sized pieces of `send` from `root`.
    ///
    /// Rank `r` receives `counts[r]` elements starting at `displs[r]` into
    /// `recv`, whose length must equal its own count. `send`, `counts` and
    /// `displs` are only read at the root.
    pub fn scatterv<T: MpiDatatype>(
        &self,
        send: &[T],
        counts: &[i32],
        displs: &[i32],
        recv: &mut [T],
        root: i32,
    ) -> Result<()> {
        self.check_rank(root)?;
        if self.rank() == root {
            self.check_layout(send.len(), counts, displs)?;
        }
        let ret = unsafe {
            ffi::hellompi_scatterv(
                send.as_ptr().cast(),
                counts.as_ptr(),
                displs.as_ptr(),
                recv.as_mut_ptr().cast(),
                recv.len() as i64,
                T::TAG as i32,
                root,
                self.handle,
            )
        };
        Error::check(ret)
    }

    /// Gather variable-sized contributions into `recv` at `root`.
    ///
    /// Rank `r`'s `send` lands at `recv[displs[r]..displs[r] + counts[r]]`.
    /// `recv`, `counts` and `displs` are only read at the root.
    pub fn gatherv<T: MpiDatatype>(
        &self,
        send: &[T],
        recv: &mut [T],
        counts: &[i32],
        displs: &[i32],
        root: i32,
    ) -> Result<()> {
        self.check_rank(root)?;
        if self.rank() == root {
            self.check_layout(recv.len(), counts, displs)?;
        }
        let ret = unsafe {
            ffi::hellompi_gatherv(
                send.as_ptr().cast(),
                send.len() as i64,
                recv.as_mut_ptr().cast(),
                counts.as_ptr(),
                displs.as_ptr(),
                T::TAG as i32,
                root,
                self.handle,
            )
        };
        Error::check(ret)
    }

    /// Check that `counts`/`displs` describe pieces of a buffer of `len`.
    fn check_layout(&self, len: usize, counts: &[i32], displs: &[i32]) -> Result<()> {
        let size = self.size() as usize;
        if counts.len() != size || displs.len() != size {
            return Err(Error::InvalidCount(counts.len() as i64));
        }
        for (&count, &displ) in counts.iter().zip(displs) {
            let end = i64::from(displ) + i64::from(count);
            if count < 0 || displ < 0 || end > len as i64 {
                return Err(Error::InvalidCount(end));
            }
        }
        Ok(())
    }

    /// Reduce element-wise to `root`.
    ///
    /// `recv` is only written at the root but must have the same length as
    /// `send` on every rank.
    pub fn reduce<T: MpiDatatype>(
        &self,
        send: &[T],
        recv: &mut [T],
        op: ReduceOp,
        root: i32,
    ) -> Result<()> {
        self.check_rank(root)?;
        if send.len() != recv.len() {
            return Err(Error::InvalidCount(recv.len() as i64));
        }
        let ret = unsafe {
            ffi::hellompi_reduce(
                send.as_ptr().cast(),
                recv.as_mut_ptr().cast(),
                send.len() as i64,
                T::TAG as i32,
                op as i32,
                root,
                self.handle,
            )
        };
        Error::check(ret)
    }

    /// Reduce a single value to `root`.
    ///
    /// Returns `Some(result)` at the root and `None` everywhere else.
    pub fn reduce_scalar<T: MpiDatatype>(
        &self,
        value: T,
        op: ReduceOp,
        root: i32,
    ) -> Result<Option<T>> {
        let send = [value];
        let mut recv = [T::default()];
        self.reduce(&send, &mut recv, op, root)?;
        Ok((self.rank() == root).then_some(recv[0]))
    }
}

// Communicators are not Send or Sync
// (MPI communicators have thread-safety requirements)
