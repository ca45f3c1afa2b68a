// Lifecycle management for the UniFi Network Controller container:
// start, stop, backup and restore on top of the Docker CLI.

pub mod actions;
pub mod archive;
pub mod config;
pub mod context;
pub mod error;
pub mod version;

// Re-export dependencies used in public interfaces
pub use controller_common as common;
pub use controller_runtime as runtime;

pub use actions::{
    backup, restore, start_server, stop_server, ArchiveLocation, BackupRequest, Ownership,
    RestoreRequest, StartRequest,
};
pub use config::ControllerConfig;
pub use context::ControllerContext;
pub use error::{FatalError, Result};
