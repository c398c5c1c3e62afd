//! Mapping of Rust primitive types to MPI datatypes.
//!
//! | Rust Type | MPI Equivalent  | Tag |
//! |-----------|-----------------|-----|
//! | `f32`     | `MPI_FLOAT`     | 0   |
//! | `f64`     | `MPI_DOUBLE`    | 1   |
//! | `i32`     | `MPI_INT32_T`   | 2   |
//! | `i64`     | `MPI_INT64_T`   | 3   |
//! | `u8`      | `MPI_UINT8_T`   | 4   |
//! | `u32`     | `MPI_UINT32_T`  | 5   |
//! | `u64`     | `MPI_UINT64_T`  | 6   |

mod sealed {
    pub trait Sealed {}
}

/// Tag values matching the `HELLOMPI_*` datatype defines in `csrc/hellompi.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DatatypeTag {
    /// 32-bit floating point (`MPI_FLOAT`)
    F32 = 0,
    /// 64-bit floating point (`MPI_DOUBLE`)
    F64 = 1,
    /// 32-bit signed integer (`MPI_INT32_T`)
    I32 = 2,
    /// 64-bit signed integer (`MPI_INT64_T`)
    I64 = 3,
    /// 8-bit unsigned integer (`MPI_UINT8_T`)
    U8 = 4,
    /// 32-bit unsigned integer (`MPI_UINT32_T`)
    U32 = 5,
    /// 64-bit unsigned integer (`MPI_UINT64_T`)
    U64 = 6,
}

/// Types that can travel through the communicator's typed operations.
///
/// Sealed: only the primitives listed in the module table implement it.
/// Encoded payloads travel as `u8` buffers.
pub trait MpiDatatype: sealed::Sealed + Copy + Default + Send + 'static {
    /// The datatype tag used for FFI dispatch to the C layer.
    const TAG: DatatypeTag;
}

macro_rules! impl_mpi_datatype {
    ($ty:ty, $tag:expr) => {
        impl sealed::Sealed for $ty {}
        impl MpiDatatype for $ty {
            const TAG: DatatypeTag = $tag;
        }
    };
}

impl_mpi_datatype!(f32, DatatypeTag::F32);
impl_mpi_datatype!(f64, DatatypeTag::F64);
impl_mpi_datatype!(i32, DatatypeTag::I32);
impl_mpi_datatype!(i64, DatatypeTag::I64);
impl_mpi_datatype!(u8, DatatypeTag::U8);
impl_mpi_datatype!(u32, DatatypeTag::U32);
impl_mpi_datatype!(u64, DatatypeTag::U64);
