use thiserror::Error;

// Re-export dependencies potentially needed by consumers (like the lifecycle actions)
pub use controller_common as common;

pub mod client;
pub mod inventory;
pub mod run_spec;
pub mod runner;
pub mod test_utils;
#[cfg(feature = "testing")]
pub mod testing;

// --- Custom Error Type ---
/// Failure talking to the container runtime CLI.
///
/// Standard error output of the subprocess is never part of the message; the
/// caller adds its own context about what was being attempted.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("unable to locate Docker CLI")]
    NotFound,
    #[error("{action}")]
    CommandFailed {
        action: &'static str,
        code: Option<i32>,
    },
    #[error("{action}: {source}")]
    Spawn {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to decode {kind} listing: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// Define local Result using the crate's Error type
pub type Result<T> = std::result::Result<T, RuntimeError>;

pub use client::{DockerCli, DOCKER_BINARY};
pub use inventory::{Container, Image, Inventory, Volume};
pub use run_spec::{Mount, PortMapping, RunOutcome, RunSpec};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
