//! Logging setup for the binaries.
//!
//! The library logs through the `log` facade; binaries install `env_logger`
//! here. Records go to stderr so they never mix with the report on stdout,
//! and each one carries the rank because every process of a run shares the
//! same terminal.

use std::io::Write;

/// Level used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the logger for process `rank`.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. Calling this more than once is
/// harmless; later calls are ignored.
pub fn init_logging(rank: i32) {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_FILTER);
    let _ = env_logger::Builder::from_env(env)
        .format(move |buf, record| {
            writeln!(
                buf,
                "[rank {rank}] {:<5} {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

/// Install the logger with an explicit level, ignoring `RUST_LOG`.
pub fn init_logging_with_level(rank: i32, level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format(move |buf, record| {
            writeln!(buf, "[rank {rank}] {:<5} {}", record.level(), record.args())
        })
        .try_init();
}
