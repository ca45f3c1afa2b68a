//! The four user-facing lifecycle actions and the steps they share.

use std::path::PathBuf;

use controller_common::ImageRef;
use controller_runtime::{CommandRunner, DockerCli};
use tracing::info;

use crate::error::{FatalError, Result};

pub mod backup;
pub mod restore;
pub mod start;
pub mod stop;

pub use backup::{backup, BackupRequest};
pub use restore::{restore, RestoreRequest};
pub use start::{start_server, StartRequest};
pub use stop::stop_server;

/// Numeric owner given to a freshly written backup archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    /// Real user and group of this process.
    pub fn current() -> Self {
        Self {
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
        }
    }
}

/// Archive location as a canonical directory plus a file name within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLocation {
    pub dir: PathBuf,
    pub name: String,
}

impl ArchiveLocation {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Directory as passed to a bind mount.
    pub(crate) fn dir_str(&self) -> String {
        self.dir.to_string_lossy().into_owned()
    }
}

/// Pull `image` unless it is already present locally.
pub(crate) fn ensure_image<R: CommandRunner>(docker: &DockerCli<R>, image: &ImageRef) -> Result<()> {
    let reference = image.to_string();
    let present = docker
        .list_images()
        .and_then(|images| images.contains(&reference))
        .map_err(FatalError::runtime("unable to list images"))?;
    if present {
        return Ok(());
    }

    info!("Docker image [{reference}] not available - attempting to pull");
    docker
        .pull_image(image)
        .map_err(FatalError::runtime(format!("unable to pull [{reference}]")))?;
    info!("Successfully pulled Docker image");
    Ok(())
}

/// Create volume `name` unless it is among `existing`.
pub(crate) fn ensure_volume<R: CommandRunner>(
    docker: &DockerCli<R>,
    name: &str,
    existing: &[String],
) -> Result<()> {
    if existing.iter().any(|volume| volume == name) {
        return Ok(());
    }

    docker
        .create_volume(name)
        .map_err(FatalError::runtime(format!("unable to create volume [{name}]")))?;
    info!("Created volume [{name}]");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use controller_runtime::testing::FakeDocker;

    #[test]
    fn test_ensure_image_present_skips_pull() {
        let fake = FakeDocker::new().with_image("alpine", "latest");
        let docker = DockerCli::with_runner(&fake);

        ensure_image(&docker, &ImageRef::latest("alpine")).unwrap();
        assert!(fake.calls_for("pull").is_empty());
    }

    #[test]
    fn test_ensure_image_pull_failure() {
        let fake = FakeDocker::new().fail_on("pull");
        let docker = DockerCli::with_runner(&fake);

        let err = ensure_image(&docker, &ImageRef::latest("alpine")).unwrap_err();
        assert_eq!(err.to_string(), "unable to pull [alpine:latest]");
    }

    #[test]
    fn test_ensure_volume_existing_is_untouched() {
        let fake = FakeDocker::new();
        let docker = DockerCli::with_runner(&fake);

        ensure_volume(&docker, "p-data", &["p-data".to_string()]).unwrap();
        assert!(fake.calls_for("volume create").is_empty());

        ensure_volume(&docker, "p-logs", &["p-data".to_string()]).unwrap();
        assert_eq!(
            fake.calls_for("volume create"),
            vec![vec!["volume", "create", "p-logs"]]
        );
    }

    #[test]
    fn test_archive_location_path() {
        let location = ArchiveLocation::new("/tmp", "out.tar.gz");
        assert_eq!(location.path(), PathBuf::from("/tmp/out.tar.gz"));
        assert_eq!(location.dir_str(), "/tmp");
    }
}
