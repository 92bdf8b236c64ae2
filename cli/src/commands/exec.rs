//! `abx exec`: run a command inside a container on the appliance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::run_attached;

/// Arguments for the exec command.
#[derive(Args)]
#[command(trailing_var_arg = true)]
pub struct ExecArgs {
    /// Container name
    pub container: String,

    /// Command and arguments to run in the container
    #[arg(required = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Run `abx exec`.
///
/// Streams the container process through `docker exec -i -t` and exits with
/// its status.
///
/// # Errors
///
/// Returns an error if the appliance has no local state or the session fails.
pub async fn run(app: &AppContext, args: ExecArgs) -> Result<ExitCode> {
    let mut docker_args = Vec::with_capacity(args.command.len() + 1);
    docker_args.push(args.container);
    docker_args.extend(args.command);
    run_attached(app, "docker exec -i -t", &docker_args).await
}
