//! Command implementations

pub mod cancel;
pub mod daemon;
pub mod db;
pub mod deploy;
pub mod destroy;
pub mod exec;
pub mod init;
pub mod logs;
pub mod metrics;
pub mod pull;
pub mod push;
pub mod renew;
pub mod restore;
pub mod ssh;
pub mod status;

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::{CommandOutput, SessionFactory};
use crate::application::services::executor::CommandExecutor;
use crate::domain::ApplianceError;
use crate::infra::terminal::StdinTerminal;

/// Run `command` with `args` on the appliance, attached to this terminal,
/// and exit with the remote status.
///
/// # Errors
///
/// Returns an error if local state is missing or the session fails. A
/// non-zero remote status is not an error.
pub(crate) async fn run_attached(
    app: &AppContext,
    command: &str,
    args: &[String],
) -> Result<ExitCode> {
    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);
    mirror_exit(executor.exec(command, args, &StdinTerminal).await)
}

/// Run a buffered daemon command. A non-zero exit prints the command's
/// stderr and comes back as the exit code to finish with.
///
/// # Errors
///
/// Returns an error if the session fails.
pub(crate) async fn run_reported<F: SessionFactory>(
    app: &AppContext,
    executor: &CommandExecutor<'_, F>,
    command: &str,
) -> Result<Result<CommandOutput, ExitCode>> {
    match executor.run(command).await {
        Ok(output) => Ok(Ok(output)),
        Err(ApplianceError::Command { code, stderr }) => {
            app.output.error(String::from_utf8_lossy(&stderr).trim_end());
            Ok(Err(exit_code(code)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Map the outcome of an attached remote command onto the process exit code.
pub(crate) fn mirror_exit(result: Result<(), ApplianceError>) -> Result<ExitCode> {
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(ApplianceError::Command { code, .. }) => Ok(exit_code(code)),
        Err(e) => Err(e.into()),
    }
}

/// Remote statuses above 255 saturate.
pub(crate) fn exit_code(code: u32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}
