use controller_common::ServerPrefix;
use controller_runtime::CommandRunner;
use tracing::{info, instrument};

use crate::context::ControllerContext;
use crate::error::{FatalError, Result};

/// Stop the server container. It must exist and be running.
#[instrument(skip(ctx, server_prefix), fields(server_prefix = %server_prefix))]
pub fn stop_server<R: CommandRunner>(
    ctx: &ControllerContext<R>,
    server_prefix: &ServerPrefix,
) -> Result<()> {
    let container_name = server_prefix.server_container_name();
    let container = ctx
        .docker
        .list_containers()
        .and_then(|containers| containers.get(&container_name))
        .map_err(FatalError::runtime("unable to list containers"))?
        .ok_or_else(|| FatalError::ContainerMissing(container_name.clone()))?;

    if !container.running {
        return Err(FatalError::ContainerNotRunning(container_name));
    }

    info!("Stopping server [{container_name}]");
    ctx.docker
        .stop_container(&container_name)
        .map_err(FatalError::runtime("unable to stop server"))?;
    info!("Server has stopped");
    Ok(())
}
