//! `abx push <source>... <target>`: copy local files to the appliance.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::executor::CommandExecutor;
use crate::application::services::transfer::FileTransfer;
use crate::infra::fs::HostFs;

/// Arguments for the push command.
#[derive(Args)]
pub struct PushArgs {
    /// Local files or directories
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<PathBuf>,

    /// Remote target
    #[arg(required = true, value_name = "TARGET")]
    pub target: String,
}

/// Run `abx push`.
///
/// # Errors
///
/// Returns an error if a source cannot be resolved, the appliance has no
/// local state, or a remote command fails.
pub async fn run(app: &AppContext, args: PushArgs) -> Result<ExitCode> {
    let mut sources = Vec::with_capacity(args.sources.len());
    for source in &args.sources {
        sources.push(resolve_source(source).await?);
    }

    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);
    FileTransfer::new(&executor, &HostFs)
        .push(&sources, &args.target)
        .await?;
    Ok(ExitCode::SUCCESS)
}

/// Absolute form of a source argument that keeps the name it was given: a
/// link `current -> releases/v3` is pushed as `current`. Only a path that
/// has no name of its own (`..`) takes the real directory's name.
async fn resolve_source(source: &Path) -> Result<PathBuf> {
    let context = || format!("cannot read '{}'", source.display());
    tokio::fs::metadata(source).await.with_context(context)?;
    let absolute = std::path::absolute(source).with_context(context)?;
    if absolute.file_name().is_some() {
        return Ok(absolute);
    }
    tokio::fs::canonicalize(source).await.with_context(context)
}
