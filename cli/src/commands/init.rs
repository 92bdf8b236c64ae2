//! `abx init`: provision a new appliance and wait until it is ready.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::{AppContext, CARD_AUTH_TEXT};
use crate::application::ports::ApplianceStore;
use crate::application::services::provision::{MachineOptions, Provisioner};
use crate::domain::ApplianceError;
use crate::infra::network::TokioNetworkProbe;
use crate::output::TerminalReporter;

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Datacenter region
    #[arg(short, long, default_value = "nyc1")]
    pub region: String,

    /// Machine size slug
    #[arg(short, long, default_value = "s-1vcpu-1gb-intel")]
    pub size: String,

    /// Data volume size in GB
    #[arg(short, long, default_value_t = 1)]
    pub data_size: u32,

    /// Provision into your own DigitalOcean account
    #[arg(long, env = "DIGITALOCEAN_ACCESS_TOKEN", hide_env_values = true)]
    pub digitalocean_access_token: Option<String>,

    /// Acrobox API token
    #[arg(long, env = "ACROBOX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip the payment authorization prompt
    #[arg(short, long)]
    pub force: bool,
}

/// Run `abx init`.
///
/// # Errors
///
/// Returns an error if the appliance already exists, the user declines, the
/// service refuses the request, or a readiness stage times out.
pub async fn run(app: &AppContext, args: InitArgs) -> Result<ExitCode> {
    let store = app.store();
    if store.exists() {
        return Err(ApplianceError::AlreadyExists(store.dir()).into());
    }
    app.confirm_by_name(args.force, &["Payment authorization required.", CARD_AUTH_TEXT])?;
    app.output
        .step(&format!("Initializing with '{}'.", app.settings.addr));

    let service = app.service(args.token)?;
    let sessions = app.sessions();
    let reporter = TerminalReporter::new(&app.output);
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &TokioNetworkProbe,
        store: &store,
        reporter: &reporter,
    };
    let opts = MachineOptions {
        name: app.settings.host.clone(),
        region: args.region,
        size: args.size,
        data_size: args.data_size,
        access_token: args.digitalocean_access_token,
        port: app.settings.port,
    };

    match provisioner.provision(&opts).await {
        Ok(state) => {
            tracing::debug!(?state, "provisioning finished");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            reporter.fail();
            Err(e.into())
        }
    }
}
