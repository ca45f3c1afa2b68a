use clap::Parser;
use color_eyre::eyre;
use controller_lib::version::{default_version_file, load_image_tag};
use controller_lib::{
    backup, restore, start_server, stop_server, BackupRequest, ControllerConfig,
    ControllerContext, Ownership, RestoreRequest, StartRequest,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{archive_location, validation_message, Cli, CliError, Command};

fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match validation_message(&err) {
            Some(message) => {
                eprintln!("Error: {message}");
                std::process::exit(1);
            }
            None => err.exit(),
        },
    };
    let config = ControllerConfig::from_env();
    debug!(?config, "Loaded configuration");

    let context = ControllerContext::new(config);
    if let Err(err) = run(cli, &context) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli, context: &ControllerContext) -> Result<(), CliError> {
    if !context.docker.locate() {
        return Err(CliError::DockerNotFound);
    }

    match cli.command {
        Command::Start {
            no_host_network,
            server_prefix,
        } => {
            let version_file = match cli.version_file {
                Some(path) => path,
                None => default_version_file().map_err(CliError::VersionFileLocation)?,
            };
            let image_tag = load_image_tag(&version_file)?;
            info!(%image_tag, "Resolved controller image version");

            start_server(
                context,
                &StartRequest {
                    image_tag,
                    server_prefix,
                    no_host_network,
                },
            )?;
        }
        Command::Stop { server_prefix } => stop_server(context, &server_prefix)?,
        Command::Backup {
            file,
            server_prefix,
        } => {
            let archive = archive_location(&file)?;
            backup(
                context,
                &BackupRequest {
                    server_prefix,
                    archive,
                    owner: Ownership::current(),
                },
            )?;
        }
        Command::Restore {
            file,
            server_prefix,
        } => {
            let archive = archive_location(&file)?;
            restore(
                context,
                &RestoreRequest {
                    server_prefix,
                    archive,
                },
            )?;
        }
    }
    Ok(())
}
