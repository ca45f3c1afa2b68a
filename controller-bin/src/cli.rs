use std::error::Error as _;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use controller_lib::common::{ServerPrefix, SERVER_PREFIX_DEFAULT};
use controller_lib::version::VersionError;
use controller_lib::{ArchiveLocation, FatalError};
use thiserror::Error;

/// Execution and management for UniFi Network Controller Docker image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// File holding the controller image version (default: `version` beside the executable)
    #[arg(long, value_name = "FILE", env = "UNIFI_VERSION_FILE", global = true)]
    pub version_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the controller container
    Start {
        /// Disable Docker host networking (may break ability to locate local network devices)
        #[arg(long)]
        no_host_network: bool,

        /// Prefix for controller container and associated mounted volumes
        #[arg(long, default_value = SERVER_PREFIX_DEFAULT)]
        server_prefix: ServerPrefix,
    },
    /// Stop the running controller container
    Stop {
        /// Prefix for controller container and associated mounted volumes
        #[arg(long, default_value = SERVER_PREFIX_DEFAULT)]
        server_prefix: ServerPrefix,
    },
    /// Back up the controller data volume to an archive
    Backup {
        /// Target backup archive
        #[arg(long, value_name = "ARCHIVE")]
        file: PathBuf,

        /// Prefix for controller container and associated mounted volumes
        #[arg(long, default_value = SERVER_PREFIX_DEFAULT)]
        server_prefix: ServerPrefix,
    },
    /// Restore the controller data volume from an archive
    Restore {
        /// Source backup archive
        #[arg(long, value_name = "ARCHIVE")]
        file: PathBuf,

        /// Prefix for controller container and associated mounted volumes
        #[arg(long, default_value = SERVER_PREFIX_DEFAULT)]
        server_prefix: ServerPrefix,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("unable to find Docker CLI")]
    DockerNotFound,
    #[error("file path [{}] not a valid directory", .0.display())]
    InvalidPath(PathBuf),
    #[error("unable to locate version file: {0}")]
    VersionFileLocation(#[source] std::io::Error),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Message of a rejected argument value, e.g. an invalid `--server-prefix`.
///
/// `None` for every other kind of parse error, which clap reports itself.
pub fn validation_message(err: &clap::Error) -> Option<String> {
    if err.kind() != ErrorKind::ValueValidation {
        return None;
    }
    err.source().map(|source| source.to_string())
}

/// Split `file` into a canonical, existing directory and a file name.
pub fn archive_location(file: &Path) -> Result<ArchiveLocation, CliError> {
    let invalid = || CliError::InvalidPath(file.to_path_buf());

    // Follow symlinks when the file already exists
    let resolved = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    let name = resolved
        .file_name()
        .ok_or_else(invalid)?
        .to_string_lossy()
        .into_owned();
    let parent = match resolved.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let dir = std::fs::canonicalize(&parent).map_err(|_| invalid())?;
    if !dir.is_dir() {
        return Err(invalid());
    }
    Ok(ArchiveLocation::new(dir, name))
}
