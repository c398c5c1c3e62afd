//! Greeting demo - every rank reports in, rank 0 sends a payload to the rest.
//!
//! Run with: mpiexec -n 4 ./target/debug/hello_world

use hellompi::logging::init_logging;
use hellompi::{Communicator, Greeter, GreeterConfig, Mpi, Outcome, Result, MPI_BUILD_VERSION};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mpi = match Mpi::init() {
        Ok(mpi) => mpi,
        Err(e) => {
            eprintln!("hello_world: failed to join the MPI group: {e}");
            return ExitCode::FAILURE;
        }
    };
    let world = mpi.world();
    init_logging(world.rank());
    log::debug!("thread level {:?}", mpi.thread_level());

    if let Err(e) = run(&world) {
        eprintln!("hello_world: rank {}: {e}", world.rank());
        // Peers may be blocked waiting on this rank
        world.abort(1);
    }

    // MPI is finalized when `mpi` is dropped
    drop(mpi);
    ExitCode::SUCCESS
}

fn run(world: &Communicator) -> Result<()> {
    match Mpi::version() {
        Ok(version) => log::debug!("MPI library: {version}"),
        Err(e) => log::warn!("could not query MPI version: {e}"),
    }
    if let Some(built) = MPI_BUILD_VERSION {
        log::debug!("built against MPI package {built}");
    }

    let config = GreeterConfig::from_env()?;
    log::debug!("greeter config: {config:?}");

    let greeter = Greeter::new(config);
    let stdout = std::io::stdout();
    match greeter.run(world, &mut stdout.lock())? {
        Outcome::Sent { recipients } => {
            log::info!("sent payload to ranks {recipients:?}");
        }
        Outcome::Received(payload) => {
            log::info!("received numbers {:?}", payload.numbers);
        }
    }
    Ok(())
}
