//! Error types for hellompi

use crate::ffi;
use thiserror::Error;

/// Result type for hellompi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Longest message `MPI_Error_string` may write (MPICH uses 1024).
const MAX_ERROR_STRING: usize = 1024;

/// Category of an MPI failure.
///
/// MPI implementations number their error classes differently; the C shim
/// normalizes them to these discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MpiErrorClass {
    /// Invalid buffer pointer
    Buffer = 1,
    /// Invalid count argument
    Count = 2,
    /// Invalid datatype argument
    Type = 3,
    /// Invalid tag argument
    Tag = 4,
    /// Invalid communicator
    Comm = 5,
    /// Invalid rank
    Rank = 6,
    /// Invalid root
    Root = 7,
    /// Invalid reduction operation
    Op = 8,
    /// Invalid argument of some other kind
    Arg = 9,
    /// Message truncated on receive
    Truncate = 10,
    /// Internal MPI error
    Intern = 11,
    /// Any other class (including process failures reported by the runtime)
    Other = 12,
}

impl MpiErrorClass {
    /// Map a normalized class value from the C shim.
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => MpiErrorClass::Buffer,
            2 => MpiErrorClass::Count,
            3 => MpiErrorClass::Type,
            4 => MpiErrorClass::Tag,
            5 => MpiErrorClass::Comm,
            6 => MpiErrorClass::Rank,
            7 => MpiErrorClass::Root,
            8 => MpiErrorClass::Op,
            9 => MpiErrorClass::Arg,
            10 => MpiErrorClass::Truncate,
            11 => MpiErrorClass::Intern,
            _ => MpiErrorClass::Other,
        }
    }
}

/// Error types for hellompi operations
#[derive(Error, Debug)]
pub enum Error {
    /// MPI has already been initialized in this process
    #[error("MPI has already been initialized")]
    AlreadyInitialized,

    /// A failing MPI call
    #[error("MPI error {class:?} (code {code}): {message}")]
    Mpi {
        /// Normalized error class
        class: MpiErrorClass,
        /// Raw implementation-specific error code
        code: i32,
        /// Text from `MPI_Error_string`
        message: String,
    },

    /// Rank outside `0..size`
    #[error("Invalid rank: {0}")]
    InvalidRank(i32),

    /// Element count that does not fit the MPI call
    #[error("Invalid count: {0}")]
    InvalidCount(i64),

    /// A peer in an in-process group hung up
    #[error("peer rank {0} disconnected")]
    Disconnected(i32),

    /// Payload encoding or decoding failed
    #[error("payload codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Writing a report failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an error from a non-zero MPI return code.
    ///
    /// Queries the MPI runtime for the error class and message. If the runtime
    /// cannot describe the code, the class is [`MpiErrorClass::Other`] and the
    /// message is empty.
    pub fn from_code(code: i32) -> Self {
        let mut class: i32 = 0;
        let mut buf = [0u8; MAX_ERROR_STRING];
        let mut len: i32 = 0;
        let ret = unsafe {
            ffi::hellompi_error_info(code, &mut class, buf.as_mut_ptr().cast(), &mut len)
        };

        if ret != 0 {
            return Error::Mpi {
                class: MpiErrorClass::Other,
                code,
                message: String::new(),
            };
        }

        let len = (len.max(0) as usize).min(buf.len());
        Error::Mpi {
            class: MpiErrorClass::from_raw(class),
            code,
            message: String::from_utf8_lossy(&buf[..len]).trim_end().to_string(),
        }
    }

    /// Check an MPI return code, returning Ok(()) for success.
    pub fn check(code: i32) -> Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(Error::from_code(code))
        }
    }

    /// The MPI error class, if this error came from the MPI runtime.
    pub fn mpi_class(&self) -> Option<MpiErrorClass> {
        match self {
            Error::Mpi { class, .. } => Some(*class),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_class_values_match_c_defines() {
        assert_eq!(MpiErrorClass::Buffer as i32, 1); // HELLOMPI_ERR_BUFFER
        assert_eq!(MpiErrorClass::Rank as i32, 6); // HELLOMPI_ERR_RANK
        assert_eq!(MpiErrorClass::Truncate as i32, 10); // HELLOMPI_ERR_TRUNCATE
        assert_eq!(MpiErrorClass::Other as i32, 12); // HELLOMPI_ERR_OTHER
    }

    #[test]
    fn error_class_round_trips_through_raw() {
        for raw in 1..=12 {
            assert_eq!(MpiErrorClass::from_raw(raw) as i32, raw);
        }
        assert_eq!(MpiErrorClass::from_raw(0), MpiErrorClass::Other);
        assert_eq!(MpiErrorClass::from_raw(999), MpiErrorClass::Other);
    }

    #[test]
    fn check_success_does_not_touch_mpi() {
        assert!(Error::check(0).is_ok());
    }

    #[test]
    fn non_mpi_errors_have_no_class() {
        assert_eq!(Error::Disconnected(2).mpi_class(), None);
        assert_eq!(Error::Disconnected(2).to_string(), "peer rank 2 disconnected");
    }

    #[test]
    fn mpi_error_exposes_class() {
        let err = Error::Mpi {
            class: MpiErrorClass::Rank,
            code: 6,
            message: "invalid rank".into(),
        };
        assert_eq!(err.mpi_class(), Some(MpiErrorClass::Rank));
        assert_eq!(err.to_string(), "MPI error Rank (code 6): invalid rank");
    }
}
