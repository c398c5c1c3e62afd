//! Raw FFI bindings to the C shim in `csrc/hellompi.c`.
//!
//! These are low-level unsafe functions. Use the safe wrappers in the parent module.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_double, c_int, c_void};

// Type aliases matching the C header
pub type int32_t = i32;
pub type int64_t = i64;

/// Wildcard source/tag accepted by `hellompi_recv` and `hellompi_probe`.
pub const ANY: int32_t = -1;

extern "C" {
    // ============================================================
    // Initialization and Finalization
    // ============================================================

    pub fn hellompi_init_thread(required: c_int, provided: *mut c_int) -> c_int;
    pub fn hellompi_finalize() -> c_int;
    pub fn hellompi_initialized(flag: *mut c_int) -> c_int;
    pub fn hellompi_finalized(flag: *mut c_int) -> c_int;

    // ============================================================
    // Communicators
    // ============================================================

    pub fn hellompi_comm_world() -> int32_t;
    pub fn hellompi_comm_rank(comm: int32_t, rank: *mut int32_t) -> c_int;
    pub fn hellompi_comm_size(comm: int32_t, size: *mut int32_t) -> c_int;

    // ============================================================
    // Synchronization
    // ============================================================

    pub fn hellompi_barrier(comm: int32_t) -> c_int;

    // ============================================================
    // Point-to-Point Communication
    // ============================================================

    pub fn hellompi_send(
        buf: *const c_void,
        count: int64_t,
        datatype_tag: int32_t,
        dest: int32_t,
        tag: int32_t,
        comm: int32_t,
    ) -> c_int;

    pub fn hellompi_recv(
        buf: *mut c_void,
        count: int64_t,
        datatype_tag: int32_t,
        source: int32_t,
        tag: int32_t,
        comm: int32_t,
        actual_source: *mut int32_t,
        actual_tag: *mut int32_t,
        actual_count: *mut int64_t,
    ) -> c_int;

    pub fn hellompi_probe(
        source: int32_t,
        tag: int32_t,
        datatype_tag: int32_t,
        comm: int32_t,
        actual_source: *mut int32_t,
        actual_tag: *mut int32_t,
        actual_count: *mut int64_t,
    ) -> c_int;

    // ============================================================
    // Collective Operations
    // ============================================================

    pub fn hellompi_bcast(
        buf: *mut c_void,
        count: int64_t,
        datatype_tag: int32_t,
        root: int32_t,
        comm: int32_t,
    ) -> c_int;

    pub fn hellompi_scatterv(
        sendbuf: *const c_void,
        sendcounts: *const int32_t,
        displs: *const int32_t,
        recvbuf: *mut c_void,
        recvcount: int64_t,
        datatype_tag: int32_t,
        root: int32_t,
        comm: int32_t,
    ) -> c_int;

    pub fn hellompi_gatherv(
        sendbuf: *const c_void,
        sendcount: int64_t,
        recvbuf: *mut c_void,
        recvcounts: *const int32_t,
        displs: *const int32_t,
        datatype_tag: int32_t,
        root: int32_t,
        comm: int32_t,
    ) -> c_int;

    pub fn hellompi_reduce(
        sendbuf: *const c_void,
        recvbuf: *mut c_void,
        count: int64_t,
        datatype_tag: int32_t,
        op: int32_t,
        root: int32_t,
        comm: int32_t,
    ) -> c_int;

    // ============================================================
    // Error Information
    // ============================================================

    pub fn hellompi_error_info(
        code: c_int,
        error_class: *mut int32_t,
        message: *mut c_char,
        msg_len: *mut int32_t,
    ) -> c_int;

    // ============================================================
    // Utility Functions
    // ============================================================

    pub fn hellompi_get_version(version: *mut c_char, len: *mut int32_t) -> c_int;
    pub fn hellompi_get_processor_name(name: *mut c_char, len: *mut int32_t) -> c_int;
    pub fn hellompi_wtime() -> c_double;
    pub fn hellompi_abort(comm: int32_t, errorcode: int32_t) -> c_int;
}
