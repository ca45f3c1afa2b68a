use controller_runtime::{CommandRunner, DockerCli, SystemRunner};

use crate::config::ControllerConfig;

/// Everything a lifecycle action needs: the runtime client and the fixed settings.
pub struct ControllerContext<R = SystemRunner> {
    pub docker: DockerCli<R>,
    pub config: ControllerConfig,
}

impl ControllerContext<SystemRunner> {
    pub fn new(config: ControllerConfig) -> Self {
        Self::with_runner(SystemRunner, config)
    }
}

impl<R: CommandRunner> ControllerContext<R> {
    pub fn with_runner(runner: R, config: ControllerConfig) -> Self {
        let docker = DockerCli::with_binary_name(runner, config.docker_binary.clone());
        Self { docker, config }
    }
}
