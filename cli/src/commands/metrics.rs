//! `abx metrics`: report the appliance daemon's metrics document.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::Value;

use crate::app::AppContext;
use crate::application::services::executor::CommandExecutor;
use crate::domain::containers::METRICS_COMMAND;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MetricsFormat {
    /// Labelled lines
    Term,
    /// Compact JSON on one line
    Json,
}

/// Arguments for the metrics command.
#[derive(Args)]
pub struct MetricsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = MetricsFormat::Term)]
    pub format: MetricsFormat,
}

/// Run `abx metrics`.
///
/// # Errors
///
/// Returns an error if the appliance has no local state, the session fails,
/// or the daemon prints something that is not JSON.
pub async fn run(app: &AppContext, args: &MetricsArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);

    let output = match super::run_reported(app, &executor, METRICS_COMMAND).await? {
        Ok(output) => output,
        Err(code) => return Ok(code),
    };
    let document: Value =
        serde_json::from_slice(&output.stdout).context("parsing daemon metrics")?;

    match args.format {
        MetricsFormat::Json => println!("{}", serde_json::to_string(&document)?),
        MetricsFormat::Term => {
            app.output.header("Metrics");
            super::status::print_document(app, &document)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
