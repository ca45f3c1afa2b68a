//! Docker CLI client. The only place that talks to the container runtime.

use std::cell::OnceCell;

use controller_common::ImageRef;
use tracing::{debug, instrument};

use crate::inventory::{Container, Image, Inventory, Record, Volume};
use crate::run_spec::{RunOutcome, RunSpec};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
use crate::{Result, RuntimeError};

pub const DOCKER_BINARY: &str = "docker";

const FORMAT_JSON: &str = "--format={{json .}}";

/// Drives the Docker CLI through a [`CommandRunner`].
///
/// The resolved binary path is looked up once with `which` and cached for the
/// lifetime of the client.
pub struct DockerCli<R = SystemRunner> {
    runner: R,
    binary_name: String,
    binary: OnceCell<String>,
}

impl DockerCli<SystemRunner> {
    pub fn new() -> Self {
        Self::with_runner(SystemRunner)
    }
}

impl Default for DockerCli<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> DockerCli<R> {
    pub fn with_runner(runner: R) -> Self {
        Self::with_binary_name(runner, DOCKER_BINARY)
    }

    /// Client searching for `binary_name` instead of `docker`.
    pub fn with_binary_name(runner: R, binary_name: impl Into<String>) -> Self {
        Self {
            runner,
            binary_name: binary_name.into(),
            binary: OnceCell::new(),
        }
    }

    /// Resolve and cache the CLI binary path. Returns whether it was found.
    pub fn locate(&self) -> bool {
        if self.binary.get().is_some() {
            return true;
        }

        let output = match self.runner.run("which", &[self.binary_name.clone()]) {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "Unable to run which");
                return false;
            }
        };

        match output.stdout.first() {
            Some(path) if output.success() => {
                debug!(%path, "Located Docker CLI");
                self.binary.get_or_init(|| path.clone());
                true
            }
            _ => false,
        }
    }

    /// Cached binary path, locating it on demand.
    pub fn binary(&self) -> Result<&str> {
        if !self.locate() {
            return Err(RuntimeError::NotFound);
        }
        self.binary
            .get()
            .map(String::as_str)
            .ok_or(RuntimeError::NotFound)
    }

    fn exec(&self, action: &'static str, args: Vec<String>) -> Result<CommandOutput> {
        let binary = self.binary()?;
        let output = self
            .runner
            .run(binary, &args)
            .map_err(|source| RuntimeError::Spawn { action, source })?;

        if !output.success() {
            debug!(
                action,
                code = ?output.code,
                stderr = ?output.stderr,
                "Docker CLI exited with failure"
            );
            return Err(RuntimeError::CommandFailed {
                action,
                code: output.code,
            });
        }
        Ok(output)
    }

    fn list<T: Record>(&self, action: &'static str, args: &[&str]) -> Result<Inventory<T>> {
        let mut args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        args.push(FORMAT_JSON.to_string());
        let output = self.exec(action, args)?;
        Ok(Inventory::new(output.stdout))
    }

    /// Local images keyed by `repository:tag`.
    pub fn list_images(&self) -> Result<Inventory<Image>> {
        self.list("unable to list images", &["images"])
    }

    /// All containers, stopped ones included, keyed by name.
    pub fn list_containers(&self) -> Result<Inventory<Container>> {
        self.list("unable to list containers", &["ps", "--all"])
    }

    pub fn list_volumes(&self) -> Result<Inventory<Volume>> {
        self.list("unable to list volumes", &["volume", "ls"])
    }

    #[instrument(skip(self, image), fields(image = %image))]
    pub fn pull_image(&self, image: &ImageRef) -> Result<()> {
        self.exec(
            "unable to pull image",
            vec!["pull".to_string(), "--quiet".to_string(), image.to_string()],
        )?;
        Ok(())
    }

    pub fn create_volume(&self, name: &str) -> Result<()> {
        self.exec(
            "unable to create volume",
            vec!["volume".to_string(), "create".to_string(), name.to_string()],
        )?;
        Ok(())
    }

    /// Fails if the volume does not exist.
    pub fn delete_volume(&self, name: &str) -> Result<()> {
        self.exec(
            "unable to delete volume",
            vec!["volume".to_string(), "rm".to_string(), name.to_string()],
        )?;
        Ok(())
    }

    #[instrument(skip(self, spec), fields(image = %spec.image, name = ?spec.name))]
    pub fn run_container(&self, spec: &RunSpec) -> Result<RunOutcome> {
        let output = self.exec("unable to run image", spec.to_args())?;
        Ok(RunOutcome::from_stdout(&output.stdout))
    }

    pub fn stop_container(&self, name: &str) -> Result<()> {
        self.exec(
            "unable to stop container",
            vec!["stop".to_string(), name.to_string()],
        )?;
        Ok(())
    }
}
