//! `abx logs [args...]`: container logs from the appliance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::run_attached;

/// Arguments for the logs command.
#[derive(Args)]
#[command(trailing_var_arg = true)]
pub struct LogsArgs {
    /// Arguments passed to `docker logs`, e.g. `--follow web`
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Run `abx logs`.
///
/// # Errors
///
/// Returns an error if the appliance has no local state or the session fails.
pub async fn run(app: &AppContext, args: LogsArgs) -> Result<ExitCode> {
    run_attached(app, "docker logs", &args.args).await
}
