//! Database access on the appliance: `db/info`, `psql` and `redis-cli`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ApplianceStore as _;
use crate::application::services::executor::CommandExecutor;
use crate::commands::run_attached;
use crate::domain::containers::{DATABASE_PASSWORD_COMMAND, PSQL_COMMAND, REDIS_CLI_COMMAND};
use crate::domain::endpoint::USERNAME;
use crate::infra::store::PRIVATE_KEY_FILE;

/// Arguments passed through to a database client.
#[derive(Args)]
#[command(trailing_var_arg = true, disable_help_flag = true)]
pub struct ClientArgs {
    /// Arguments for the client, e.g. `-c 'select 1'`
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Run `abx db/info`: connection details for tunnelling to postgres.
///
/// # Errors
///
/// Returns an error if the appliance has no local state or the password
/// cannot be read.
pub async fn info(app: &AppContext) -> Result<ExitCode> {
    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);
    let output = executor.run(DATABASE_PASSWORD_COMMAND).await?;
    let password = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let key_file = app.store().dir().join(PRIVATE_KEY_FILE).display().to_string();

    for (label, value) in [
        ("Host", endpoint.address.as_str()),
        ("Username", USERNAME),
        ("Password", password.as_str()),
        ("SSH Key File", key_file.as_str()),
    ] {
        println!("{label:<15}{value}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Run `abx psql [args...]` in the postgres container.
///
/// # Errors
///
/// Returns an error if the appliance has no local state or the session fails.
pub async fn psql(app: &AppContext, args: ClientArgs) -> Result<ExitCode> {
    run_attached(app, PSQL_COMMAND, &args.args).await
}

/// Run `abx redis-cli [args...]` in the redis container.
///
/// # Errors
///
/// Returns an error if the appliance has no local state or the session fails.
pub async fn redis_cli(app: &AppContext, args: ClientArgs) -> Result<ExitCode> {
    run_attached(app, REDIS_CLI_COMMAND, &args.args).await
}
