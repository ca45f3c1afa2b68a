use std::path::PathBuf;

use controller_runtime::RuntimeError;
use thiserror::Error;

/// Error ending a lifecycle action. Its message is what the user sees.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("container [{0}] already exists")]
    ContainerExists(String),

    #[error("container [{0}] does not exist")]
    ContainerMissing(String),

    #[error("container [{0}] not running")]
    ContainerNotRunning(String),

    #[error("container [{0}] currently running, associated data volume must not be in use for restore")]
    ContainerRunning(String),

    #[error("data volume [{0}] does not exist for backup")]
    DataVolumeMissing(String),

    #[error("unable to open archive [{}]", .path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("it appears [{}] is not a tar file", .path.display())]
    NotTarArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive [{}] doesn't appear to be a controller data backup", .0.display())]
    NotControllerBackup(PathBuf),

    /// A runtime call failed; `context` says what was being attempted.
    #[error("{context}")]
    Runtime {
        context: String,
        #[source]
        source: RuntimeError,
    },
}

impl FatalError {
    pub fn runtime(context: impl Into<String>) -> impl FnOnce(RuntimeError) -> FatalError {
        let context = context.into();
        move |source| FatalError::Runtime { context, source }
    }
}

pub type Result<T> = std::result::Result<T, FatalError>;
