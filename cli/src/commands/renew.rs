//! `abx renew`: renew the appliance subscription.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::{AppContext, CARD_AUTH_TEXT};
use crate::application::services::machine;

/// Arguments for the renew command.
#[derive(Args)]
pub struct RenewArgs {
    /// Acrobox API token
    #[arg(long, env = "ACROBOX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip the payment authorization prompt
    #[arg(short, long)]
    pub force: bool,
}

/// Run `abx renew`.
///
/// # Errors
///
/// Returns an error if the user declines, the appliance has no local state,
/// or the service refuses.
pub async fn run(app: &AppContext, args: RenewArgs) -> Result<ExitCode> {
    app.confirm_by_name(args.force, &["Payment authorization required.", CARD_AUTH_TEXT])?;

    let service = app.service(args.token)?;
    machine::renew(&service, &app.store()).await?;
    app.output.success("Service renewed.");
    Ok(ExitCode::SUCCESS)
}
