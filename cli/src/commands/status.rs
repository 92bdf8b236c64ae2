//! `abx status`: report the appliance daemon's status document.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::app::AppContext;
use crate::application::services::executor::CommandExecutor;
use crate::domain::provisioning::SERVICE_STATUS_COMMAND;

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Print the status document as compact JSON
    #[arg(long)]
    pub json: bool,
}

/// Run `abx status`.
///
/// # Errors
///
/// Returns an error if the appliance has no local state, the session fails,
/// or the daemon prints something that is not JSON.
pub async fn run(app: &AppContext, args: &StatusArgs) -> Result<ExitCode> {
    let endpoint = app.endpoint().await?;
    let sessions = app.sessions();
    let executor = CommandExecutor::new(&sessions, &endpoint);

    let output = match super::run_reported(app, &executor, SERVICE_STATUS_COMMAND).await? {
        Ok(output) => output,
        Err(code) => return Ok(code),
    };
    let document: Value =
        serde_json::from_slice(&output.stdout).context("parsing daemon status")?;

    if args.json {
        println!("{}", serde_json::to_string(&document)?);
        return Ok(ExitCode::SUCCESS);
    }

    app.output.header("System");
    app.output.kv("IPv4", &endpoint.address);
    app.output.kv("Hostname", &app.settings.host);
    print_document(app, &document)?;
    Ok(ExitCode::SUCCESS)
}

/// One labelled line per top-level field; anything but an object is
/// printed as indented JSON.
pub(crate) fn print_document(app: &AppContext, document: &Value) -> Result<()> {
    match document {
        Value::Object(fields) => {
            for (key, value) in fields {
                app.output.kv(&field_label(key), &field_value(value));
            }
        }
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

/// `system_booted_at` → `System booted at`.
fn field_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

fn field_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
