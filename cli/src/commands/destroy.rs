//! `abx destroy`: destroy the machine and remove its local state.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::machine;
use crate::domain::machine::DestroyRequest;

/// Arguments for the destroy command.
#[derive(Args)]
pub struct DestroyArgs {
    /// Token for a machine provisioned into your own DigitalOcean account
    #[arg(long, env = "DIGITALOCEAN_ACCESS_TOKEN", hide_env_values = true)]
    pub digitalocean_access_token: Option<String>,

    /// Acrobox API token
    #[arg(long, env = "ACROBOX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

/// Run `abx destroy`.
///
/// # Errors
///
/// Returns an error if the user declines, the appliance has no local state,
/// the service refuses, or local state cannot be removed.
pub async fn run(app: &AppContext, args: DestroyArgs) -> Result<ExitCode> {
    let prompt = format!(
        "Confirmation to destroy machine '{}' is required.",
        app.settings.host
    );
    app.confirm_by_name(
        args.force,
        &[&prompt, "All data will be lost.", "This action cannot be undone."],
    )?;

    let service = app.service(args.token)?;
    let request = DestroyRequest {
        access_token: args.digitalocean_access_token,
    };
    machine::destroy(&service, &app.store(), &request).await?;
    app.output.success("Machine destroyed.");
    Ok(ExitCode::SUCCESS)
}
