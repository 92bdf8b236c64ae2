//! Any subcommand abx does not know itself (`env/set`, `db/list`, `backup`,
//! ...) runs inside the appliance daemon's container.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::run_attached;
use crate::domain::containers::DAEMON_EXEC;

/// Run `abx <command> [args...]` as
/// `docker exec -i -t acroboxd acroboxd <command> [args...]`.
///
/// # Errors
///
/// Returns an error if the appliance has no local state or the session fails.
pub async fn run(app: &AppContext, argv: Vec<String>) -> Result<ExitCode> {
    run_attached(app, DAEMON_EXEC, &argv).await
}
