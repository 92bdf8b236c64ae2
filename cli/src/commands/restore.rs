//! `abx restore [args...]`: restore appliance data from a backup and follow
//! the restore job's logs.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use crate::app::AppContext;
use crate::application::services::executor::CommandExecutor;
use crate::commands::mirror_exit;
use crate::domain::containers::{FOLLOW_LOGS_COMMAND, RESTORE_COMMAND};
use crate::domain::quote::command_line;
use crate::infra::terminal::StdinTerminal;

/// Arguments for the restore command.
#[derive(Args)]
#[command(trailing_var_arg = true)]
pub struct RestoreArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Arguments passed to the daemon's restore command
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// What the daemon prints once a restore job has started.
#[derive(Debug, Deserialize)]
struct RestoreStarted {
    container_id: String,
}

/// Run `abx restore`.
///
/// # Errors
///
/// Returns an error if the user declines, the appliance has no local state,
/// the session fails, or the daemon's reply names no container.
pub async fn run(app: &AppContext, args: RestoreArgs) -> Result<ExitCode> {
    let prompt = format!(
        "Confirmation to restore machine '{}' is required.",
        app.settings.host
    );
    app.confirm_by_name(
        args.force,
        &[
            &prompt,
            "This action has the potential to overwrite data with old data.",
            "This action cannot be undone.",
        ],
    )?;

    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);
    let command = command_line(RESTORE_COMMAND, &args.args);
    let output = match super::run_reported(app, &executor, &command).await? {
        Ok(output) => output,
        Err(code) => return Ok(code),
    };
    let container_id = restore_container(&output.stdout)?;
    mirror_exit(
        executor
            .exec(FOLLOW_LOGS_COMMAND, &[container_id], &StdinTerminal)
            .await,
    )
}

fn restore_container(stdout: &[u8]) -> Result<String> {
    let started: RestoreStarted =
        serde_json::from_slice(stdout).context("parsing restore reply")?;
    let id = started.container_id.trim();
    anyhow::ensure!(!id.is_empty(), "restore reply names no container");
    Ok(id.to_string())
}
