//! `abx ssh [command...]`: interactive shell or command on the appliance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::executor::CommandExecutor;
use crate::commands::{mirror_exit, run_attached};
use crate::infra::terminal::StdinTerminal;

/// Arguments for the ssh command.
#[derive(Args)]
#[command(trailing_var_arg = true)]
pub struct SshArgs {
    /// Command and arguments to run instead of a login shell
    #[arg(allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Run `abx ssh`.
///
/// Without arguments opens a login shell; otherwise runs the command. Both
/// get a pty when stdin is a terminal, and exit with the remote status.
///
/// # Errors
///
/// Returns an error if the appliance has no local state or the session fails.
pub async fn run(app: &AppContext, args: SshArgs) -> Result<ExitCode> {
    if let Some((command, rest)) = args.command.split_first() {
        return run_attached(app, command, rest).await;
    }
    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);
    mirror_exit(executor.shell(&StdinTerminal).await)
}
