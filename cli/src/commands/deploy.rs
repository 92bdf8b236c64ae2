//! `abx deploy [args...] <image>`: ship a local image to the appliance and
//! hand it to the daemon's deploy command.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::deploy::ship_image;
use crate::application::services::executor::CommandExecutor;
use crate::commands::run_attached;
use crate::domain::containers::{DAEMON_EXEC, image_name};
use crate::infra::docker::DockerCli;
use crate::infra::fs::HostFs;

/// Arguments for the deploy command.
#[derive(Args)]
#[command(trailing_var_arg = true)]
pub struct DeployArgs {
    /// Daemon deploy arguments; the last one is the local image
    #[arg(required = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Run `abx deploy`.
///
/// # Errors
///
/// Returns an error if the appliance has no local state, the image cannot
/// be exported, or the upload fails. The daemon's own status is mirrored.
pub async fn run(app: &AppContext, args: DeployArgs) -> Result<ExitCode> {
    let reference = args.args.last().context("no image given")?;
    let image = image_name(reference);

    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);
    let archive = tempfile::Builder::new()
        .prefix("abx-deploy-")
        .tempfile()
        .context("creating the image archive")?;

    app.output.step(&format!("Uploading image '{image}'."));
    ship_image(&DockerCli::default(), &executor, &HostFs, image, archive.path()).await?;
    drop(archive);

    run_attached(app, &format!("{DAEMON_EXEC} deploy"), &args.args).await
}
