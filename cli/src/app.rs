//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is built once in `Cli::run()` from the global flags and the
//! environment, then passed by reference to every command. It owns the
//! resolved settings and constructs the infrastructure adapters on demand.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::RemoteEndpoint;
use crate::infra::service::HttpProvisioningService;
use crate::infra::ssh::RusshSessionFactory;
use crate::infra::store::ApplianceDir;
use crate::output::OutputContext;

/// Authorization text shown before any action that may charge the card.
pub const CARD_AUTH_TEXT: &str =
    "I authorize Acrobox to charge my card in accordance with the terms of service.";

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Where the appliance and the provisioning service live.
pub struct ConnectionFlags {
    /// Appliance name; also the name of its state directory.
    pub host: String,
    /// Provisioning service base URL.
    pub addr: String,
    /// Appliance SSH port.
    pub port: u16,
    /// Override for the state home directory.
    pub home: Option<PathBuf>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Connection options.
    pub connection: ConnectionFlags,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub home: PathBuf,
    pub host: String,
    pub addr: String,
    pub port: u16,
}

impl Settings {
    /// Resolve the state home: the explicit override, else
    /// `<config dir>/abx`.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the platform has no
    /// configuration directory.
    pub fn resolve(flags: &ConnectionFlags) -> Result<Self> {
        let home = match &flags.home {
            Some(home) => home.clone(),
            None => dirs::config_dir()
                .context("cannot determine configuration directory; set ACROBOX_HOME")?
                .join("abx"),
        };
        Ok(Self {
            home,
            host: flags.host.clone(),
            addr: flags.addr.clone(),
            port: flags.port,
        })
    }
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Resolved configuration.
    pub settings: Settings,
    /// When `true`, skip interactive prompts.
    ///
    /// Set when the `CI` or `ACROBOX_YES` environment variables are present;
    /// commands add their own `--force` flag on top.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the state home cannot be resolved.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let non_interactive = std::env::var_os("CI").is_some()
            || std::env::var_os("ACROBOX_YES").is_some();
        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            settings: Settings::resolve(&flags.connection)?,
            non_interactive,
        })
    }

    /// Local state of the selected appliance.
    #[must_use]
    pub fn store(&self) -> ApplianceDir {
        ApplianceDir::new(&self.settings.home, &self.settings.host)
    }

    /// SSH session factory.
    #[must_use]
    pub fn sessions(&self) -> RusshSessionFactory {
        RusshSessionFactory::default()
    }

    /// Endpoint of the selected appliance, read from local state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the appliance has no local state.
    pub async fn endpoint(&self) -> Result<RemoteEndpoint> {
        use crate::application::ports::ApplianceStore as _;
        Ok(self.store().endpoint(self.settings.port).await?)
    }

    /// Provisioning service client, authenticating with `token` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn service(&self, token: Option<String>) -> Result<HttpProvisioningService> {
        Ok(HttpProvisioningService::new(&self.settings.addr, token)?)
    }

    /// Require the user to type the appliance name before a destructive or
    /// billable action. `force` (or a non-interactive environment) skips
    /// the prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not match or the prompt fails.
    pub fn confirm_by_name(&self, force: bool, lines: &[&str]) -> Result<()> {
        if force || self.non_interactive {
            return Ok(());
        }
        let host = &self.settings.host;
        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                self.output.warn(line);
            } else {
                self.output.note(line);
            }
        }
        let input: String = dialoguer::Input::new()
            .with_prompt(format!("Please type '{host}' to agree"))
            .allow_empty(true)
            .interact_text()
            .context("reading confirmation")?;
        anyhow::ensure!(input.trim() == host, "Input must be '{host}' to agree.");
        Ok(())
    }
}
