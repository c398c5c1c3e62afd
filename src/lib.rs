//! # hellompi
//!
//! MPI greeter: every process reports its host, rank and group size, then the
//! root rank sends one structured [`Payload`] to every other rank.
//!
//! MPI is reached through a thin C layer compiled by `build.rs`. The crate
//! provides:
//! - [`Mpi`], the process's MPI environment, and the explicit [`Communicator`]
//!   handle every operation goes through
//! - typed point-to-point (`send`, `recv`, `probe`, `recv_vec`)
//! - the [`Transport`] seam with an MPI implementation and an in-process
//!   [`LocalGroup`] for running a whole group inside one test
//! - typed collectives (`broadcast`, `scatterv`, `gatherv`, `reduce`)
//! - the [`Greeter`] demo, a block-partitioned parallel sum ([`sum`]), a
//!   Monte Carlo estimate of pi ([`pi`]) and row-block matrix
//!   multiplication ([`matrix`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use hellompi::{Greeter, GreeterConfig, Mpi};
//!
//! fn main() -> Result<(), hellompi::Error> {
//!     let mpi = Mpi::init()?;
//!     let world = mpi.world();
//!
//!     let greeter = Greeter::new(GreeterConfig::from_env()?);
//!     greeter.run(&world, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```
//!
//! Run with `mpiexec -n 4 target/debug/hello_world`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod comm;
mod config;
mod datatype;
mod error;
mod ffi;
mod greeter;
mod local;
pub mod logging;
pub mod matrix;
mod payload;
pub mod pi;
mod status;
pub mod sum;
mod transport;

pub use comm::Communicator;
pub use config::{parse_seed, GreeterConfig, DEFAULT_ROOT, DEFAULT_TAG};
pub use datatype::{DatatypeTag, MpiDatatype};
pub use error::{Error, MpiErrorClass, Result};
pub use greeter::{greeting_line, Greeter, Outcome};
pub use local::{LocalEndpoint, LocalGroup};
pub use payload::{Payload, GREETING_MESSAGE, GREETING_NUMBERS};
pub use status::Status;
pub use transport::Transport;

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Upper bound on `MPI_MAX_LIBRARY_VERSION_STRING` (MPICH uses 8192).
const MAX_VERSION_STRING: usize = 8192;

/// Version of the MPI package the crate was built against, as reported by
/// pkg-config. `None` when MPI was found some other way.
pub const MPI_BUILD_VERSION: Option<&str> = option_env!("HELLOMPI_MPI_VERSION");

/// Global flag tracking whether MPI has been initialized
static MPI_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// MPI thread support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum ThreadLevel {
    /// Only single-threaded execution
    Single = 0,
    /// Multi-threaded, but MPI calls only from main thread
    Funneled = 1,
    /// Multi-threaded, but MPI calls serialized by user
    Serialized = 2,
    /// Full multi-threaded support
    Multiple = 3,
}

/// Reduction operations, matching the `HELLOMPI_*` op defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ReduceOp {
    /// Sum of values
    Sum = 0,
    /// Maximum value
    Max = 1,
    /// Minimum value
    Min = 2,
    /// Product of values
    Prod = 3,
}

/// MPI environment handle.
///
/// Joining the group: there can only be one instance of this type at a time.
/// When dropped, it finalizes MPI.
///
/// # Example
///
/// ```no_run
/// use hellompi::Mpi;
///
/// let mpi = Mpi::init().expect("Failed to initialize MPI");
/// let world = mpi.world();
/// println!("Running on {} processes", world.size());
/// // MPI is finalized when `mpi` goes out of scope
/// ```
pub struct Mpi {
    thread_level: ThreadLevel,
    /// Marker to make Mpi !Send and !Sync
    _marker: PhantomData<*const ()>,
}

impl Mpi {
    /// Initialize MPI with single-threaded support.
    ///
    /// # Errors
    ///
    /// Returns an error if MPI is already initialized or if the runtime
    /// cannot form the group.
    pub fn init() -> Result<Self> {
        Self::init_thread(ThreadLevel::Single)
    }

    /// Initialize MPI with the specified thread support level.
    ///
    /// The level actually provided can be queried with
    /// [`thread_level()`](Self::thread_level).
    pub fn init_thread(required: ThreadLevel) -> Result<Self> {
        if MPI_INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialized);
        }

        let mut provided: i32 = 0;
        let ret = unsafe { ffi::hellompi_init_thread(required as i32, &mut provided) };

        if ret != 0 {
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(Error::from_code(ret));
        }

        let thread_level = match provided {
            0 => ThreadLevel::Single,
            1 => ThreadLevel::Funneled,
            2 => ThreadLevel::Serialized,
            _ => ThreadLevel::Multiple,
        };
        log::debug!("MPI initialized (requested {required:?}, provided {thread_level:?})");

        Ok(Mpi {
            thread_level,
            _marker: PhantomData,
        })
    }

    /// Get the thread support level that was provided.
    pub fn thread_level(&self) -> ThreadLevel {
        self.thread_level
    }

    /// Get a handle to `MPI_COMM_WORLD`.
    pub fn world(&self) -> Communicator {
        Communicator::world()
    }

    /// Get the current wall-clock time in seconds.
    pub fn wtime() -> f64 {
        unsafe { ffi::hellompi_wtime() }
    }

    /// Get the MPI library version string.
    pub fn version() -> Result<String> {
        let mut buf = vec![0u8; MAX_VERSION_STRING];
        let mut len: i32 = 0;
        let ret = unsafe { ffi::hellompi_get_version(buf.as_mut_ptr().cast(), &mut len) };
        Error::check(ret)?;

        let len = (len.max(0) as usize).min(buf.len());
        let s = std::str::from_utf8(&buf[..len])
            .map_err(|_| Error::Internal("Invalid UTF-8 in version string".into()))?;
        Ok(s.trim_end().to_string())
    }

    /// Check if MPI has been initialized.
    pub fn is_initialized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::hellompi_initialized(&mut flag) };
        flag != 0
    }

    /// Check if MPI has been finalized.
    pub fn is_finalized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::hellompi_finalized(&mut flag) };
        flag != 0
    }
}

impl Drop for Mpi {
    fn drop(&mut self) {
        if MPI_INITIALIZED.load(Ordering::SeqCst) {
            unsafe {
                ffi::hellompi_finalize();
            }
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
        }
    }
}

// Mpi is not Send or Sync - MPI must be used from the thread that initialized it
// (unless thread level is Multiple)

#[cfg(test)]
mod tests {
    use super::*;

    // Communication is exercised under mpiexec:
    // cargo build --examples && mpiexec -n 4 ./target/debug/examples/test_greeter

    #[test]
    fn reduce_op_values_match_c_defines() {
        assert_eq!(ReduceOp::Sum as i32, 0); // HELLOMPI_SUM
        assert_eq!(ReduceOp::Max as i32, 1); // HELLOMPI_MAX
        assert_eq!(ReduceOp::Min as i32, 2); // HELLOMPI_MIN
        assert_eq!(ReduceOp::Prod as i32, 3); // HELLOMPI_PROD
    }

    #[test]
    fn lifecycle_flags_before_init() {
        // Both queries are legal before MPI_Init; no test here joins a group
        assert!(!Mpi::is_initialized());
        assert!(!Mpi::is_finalized());
    }

    #[test]
    fn build_version_is_never_blank() {
        if let Some(version) = MPI_BUILD_VERSION {
            assert!(!version.trim().is_empty());
        }
    }

    #[test]
    fn thread_levels_are_ordered() {
        assert!(ThreadLevel::Single < ThreadLevel::Funneled);
        assert!(ThreadLevel::Serialized < ThreadLevel::Multiple);
    }
}
