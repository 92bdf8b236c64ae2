//! `abx pull <source>... <target>`: copy files from the appliance.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::executor::CommandExecutor;
use crate::application::services::transfer::FileTransfer;
use crate::infra::fs::HostFs;

/// Arguments for the pull command.
#[derive(Args)]
pub struct PullArgs {
    /// Remote files or directories
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Local target
    #[arg(required = true, value_name = "TARGET")]
    pub target: PathBuf,
}

/// Run `abx pull`.
///
/// # Errors
///
/// Returns an error if the appliance has no local state, a remote path
/// cannot be read, or a local write fails.
pub async fn run(app: &AppContext, args: PullArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);
    FileTransfer::new(&executor, &HostFs)
        .pull(&args.sources, &args.target)
        .await?;
    Ok(ExitCode::SUCCESS)
}
