use controller_common::ServerPrefix;
use controller_runtime::{CommandRunner, RunSpec};
use tracing::{info, instrument};

use super::{ensure_image, ArchiveLocation, Ownership};
use crate::context::ControllerContext;
use crate::error::{FatalError, Result};

#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub server_prefix: ServerPrefix,
    /// Destination; the directory must already exist.
    pub archive: ArchiveLocation,
    /// Owner of the written archive.
    pub owner: Ownership,
}

/// Shell command archiving the mounted data volume into `file`, then handing
/// the archive to `owner` since tar runs as root inside the container.
pub fn backup_archive_command(data_path: &str, file: &str, owner: Ownership) -> String {
    format!(
        "/bin/tar c -zf \"{file}\" -C \"{data_path}\" . && chown {}:{} \"{file}\"",
        owner.uid, owner.gid
    )
}

/// Write a gzip tar of the data volume using a throwaway container.
///
/// Only the data volume is archived. Container state is not inspected.
#[instrument(skip(ctx, request), fields(server_prefix = %request.server_prefix))]
pub fn backup<R: CommandRunner>(ctx: &ControllerContext<R>, request: &BackupRequest) -> Result<()> {
    let config = &ctx.config;
    let volume_name_data = request.server_prefix.data_volume_name();
    let exists = ctx
        .docker
        .list_volumes()
        .and_then(|volumes| volumes.contains(&volume_name_data))
        .map_err(FatalError::runtime("unable to list volumes"))?;
    if !exists {
        return Err(FatalError::DataVolumeMissing(volume_name_data));
    }

    ensure_image(&ctx.docker, &config.backup_image)?;

    let archive_file = format!("{}/{}", config.backup_path, request.archive.name);
    let spec = RunSpec::new(config.backup_image.clone())
        .bind(request.archive.dir_str(), &config.backup_path)
        .volume(&volume_name_data, &config.volume_mount_path)
        .remove_on_exit()
        .command([
            "/bin/sh".to_string(),
            "-c".to_string(),
            backup_archive_command(&config.volume_mount_path, &archive_file, request.owner),
        ]);

    ctx.docker
        .run_container(&spec)
        .map_err(FatalError::runtime(format!(
            "unable to backup data volume [{volume_name_data}]"
        )))?;

    info!(
        "Backup successfully created at [{}]",
        request.archive.path().display()
    );
    Ok(())
}
