//! `abx cancel`: cancel the appliance subscription.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::machine;

/// Arguments for the cancel command.
#[derive(Args)]
pub struct CancelArgs {
    /// Acrobox API token
    #[arg(long, env = "ACROBOX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

/// Run `abx cancel`.
///
/// # Errors
///
/// Returns an error if the user declines, the appliance has no local state,
/// or the service refuses.
pub async fn run(app: &AppContext, args: CancelArgs) -> Result<ExitCode> {
    let prompt = format!(
        "Confirmation to cancel service '{}' is required.",
        app.settings.host
    );
    app.confirm_by_name(args.force, &[&prompt])?;

    let service = app.service(args.token)?;
    machine::cancel(&service, &app.store()).await?;
    app.output.success("Service cancelled.");
    Ok(ExitCode::SUCCESS)
}
