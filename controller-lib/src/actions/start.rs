use controller_common::ServerPrefix;
use controller_runtime::{CommandRunner, RunOutcome, RunSpec};
use tracing::{info, instrument};

use super::{ensure_image, ensure_volume};
use crate::context::ControllerContext;
use crate::error::{FatalError, Result};

#[derive(Debug, Clone)]
pub struct StartRequest {
    /// Controller image tag, from the version file.
    pub image_tag: String,
    pub server_prefix: ServerPrefix,
    /// Publish the comms and GUI ports instead of using host networking.
    pub no_host_network: bool,
}

/// Pull the controller image if needed, create its volumes and run it detached.
///
/// Refuses to start while any container (running or not) holds the server name.
/// Volumes created before a later failure are left in place.
#[instrument(skip(ctx, request), fields(server_prefix = %request.server_prefix))]
pub fn start_server<R: CommandRunner>(
    ctx: &ControllerContext<R>,
    request: &StartRequest,
) -> Result<RunOutcome> {
    let config = &ctx.config;
    let image = config.controller_image(&request.image_tag);
    ensure_image(&ctx.docker, &image)?;

    let container_name = request.server_prefix.server_container_name();
    let exists = ctx
        .docker
        .list_containers()
        .and_then(|containers| containers.contains(&container_name))
        .map_err(FatalError::runtime("unable to list containers"))?;
    if exists {
        return Err(FatalError::ContainerExists(container_name));
    }

    let volume_name_data = request.server_prefix.data_volume_name();
    let volume_name_logs = request.server_prefix.logs_volume_name();
    let existing = ctx
        .docker
        .list_volumes()
        .and_then(|volumes| volumes.names())
        .map_err(FatalError::runtime("unable to list volumes"))?;
    ensure_volume(&ctx.docker, &volume_name_data, &existing)?;
    ensure_volume(&ctx.docker, &volume_name_logs, &existing)?;

    info!("Starting server [{image}] as [{container_name}]");
    let spec = RunSpec::new(image)
        .detach()
        .name(&container_name)
        .network_host(!request.no_host_network)
        .publish(config.port_comms, config.port_comms)
        .publish(config.port_gui, config.port_gui)
        .remove_on_exit()
        .volume(&volume_name_data, config.controller_data_dir())
        .volume(&volume_name_logs, config.controller_logs_dir());

    let outcome = ctx
        .docker
        .run_container(&spec)
        .map_err(FatalError::runtime("unable to start server"))?;

    match &outcome {
        RunOutcome::Id(id) => info!("Running as container ID [{id}]"),
        RunOutcome::NoIdCaptured => info!("Server started, no container ID captured"),
    }
    Ok(outcome)
}
