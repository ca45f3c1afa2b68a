use controller_common::ServerPrefix;
use controller_runtime::{CommandRunner, RunSpec};
use tracing::{info, instrument};

use super::{ensure_image, ensure_volume, ArchiveLocation};
use crate::archive::verify_backup_archive;
use crate::context::ControllerContext;
use crate::error::{FatalError, Result};

#[derive(Debug, Clone)]
pub struct RestoreRequest {
    pub server_prefix: ServerPrefix,
    /// Source archive, produced by a previous backup.
    pub archive: ArchiveLocation,
}

/// Shell command extracting `file` into the mounted data volume.
pub fn restore_archive_command(data_path: &str, file: &str) -> String {
    format!("cd \"{data_path}\" && tar x -f \"{file}\"")
}

/// Replace the data volume with the contents of a backup archive.
///
/// The archive is verified before anything is changed. The server container
/// may exist but must not be running. Listing and then deleting the old volume
/// is not atomic against someone else using the runtime at the same time.
#[instrument(skip(ctx, request), fields(server_prefix = %request.server_prefix))]
pub fn restore<R: CommandRunner>(ctx: &ControllerContext<R>, request: &RestoreRequest) -> Result<()> {
    let config = &ctx.config;
    let archive_path = request.archive.path();
    verify_backup_archive(&archive_path)?;

    let container_name = request.server_prefix.server_container_name();
    let running = ctx
        .docker
        .list_containers()
        .and_then(|containers| containers.get(&container_name))
        .map_err(FatalError::runtime("unable to list containers"))?
        .is_some_and(|container| container.running);
    if running {
        return Err(FatalError::ContainerRunning(container_name));
    }

    let volume_name_data = request.server_prefix.data_volume_name();
    let exists = ctx
        .docker
        .list_volumes()
        .and_then(|volumes| volumes.contains(&volume_name_data))
        .map_err(FatalError::runtime("unable to list volumes"))?;
    if exists {
        ctx.docker
            .delete_volume(&volume_name_data)
            .map_err(FatalError::runtime(format!(
                "unable to remove existing data volume [{volume_name_data}]"
            )))?;
        info!("Removed existing data volume [{volume_name_data}]");
    }

    ensure_image(&ctx.docker, &config.backup_image)?;
    ensure_volume(&ctx.docker, &volume_name_data, &[])?;

    let archive_file = format!("{}/{}", config.backup_path, request.archive.name);
    let spec = RunSpec::new(config.backup_image.clone())
        .bind(request.archive.dir_str(), &config.backup_path)
        .volume(&volume_name_data, &config.volume_mount_path)
        .remove_on_exit()
        .command([
            "/bin/sh".to_string(),
            "-c".to_string(),
            restore_archive_command(&config.volume_mount_path, &archive_file),
        ]);

    ctx.docker
        .run_container(&spec)
        .map_err(FatalError::runtime(format!(
            "unable to restore data volume [{volume_name_data}]"
        )))?;

    info!(
        "Data volume successfully restored from [{}]",
        archive_path.display()
    );
    Ok(())
}
