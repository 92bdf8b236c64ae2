//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, ConnectionFlags, OutputFlags};
use crate::commands;
use crate::domain::endpoint::{DEFAULT_SSH_PORT, USERNAME};

/// Provision and operate an Acrobox appliance
#[derive(Parser)]
#[command(
    name = "abx",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Appliance name
    #[arg(long, global = true, env = "ACROBOX_HOST", default_value = USERNAME)]
    pub host: String,

    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Provisioning service address
    #[arg(long, global = true, env = "ACROBOX_ADDR", default_value = "https://acrobox.io", hide = true)]
    pub addr: String,

    /// Appliance SSH port
    #[arg(long, global = true, env = "ACROBOX_PORT", default_value_t = DEFAULT_SSH_PORT, hide = true)]
    pub port: u16,

    /// Directory holding appliance state
    #[arg(long, global = true, env = "ACROBOX_HOME", hide = true)]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision a new appliance
    Init(commands::init::InitArgs),

    /// Cancel the appliance subscription
    Cancel(commands::cancel::CancelArgs),

    /// Renew the appliance subscription
    Renew(commands::renew::RenewArgs),

    /// Destroy the appliance and remove its local state
    Destroy(commands::destroy::DestroyArgs),

    /// Open a shell, or run a command, on the appliance
    Ssh(commands::ssh::SshArgs),

    /// Copy local files or directories to the appliance
    Push(commands::push::PushArgs),

    /// Copy files or directories from the appliance
    Pull(commands::pull::PullArgs),

    /// Show appliance service status
    Status(commands::status::StatusArgs),

    /// Show appliance service metrics
    Metrics(commands::metrics::MetricsArgs),

    /// Show postgres connection details
    #[command(name = "db/info")]
    DbInfo,

    /// Open psql in the postgres container
    Psql(commands::db::ClientArgs),

    /// Open redis-cli in the redis container
    RedisCli(commands::db::ClientArgs),

    /// Restore appliance data from a backup
    Restore(commands::restore::RestoreArgs),

    /// Upload a local image and deploy it
    Deploy(commands::deploy::DeployArgs),

    /// Show container logs
    Logs(commands::logs::LogsArgs),

    /// Run a command inside a container
    Exec(commands::exec::ExecArgs),

    /// Any other command is passed to the appliance daemon
    #[command(external_subcommand)]
    Daemon(Vec<String>),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            host,
            verbose: _,
            quiet,
            no_color,
            addr,
            port,
            home,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags { no_color, quiet },
            connection: ConnectionFlags {
                host,
                addr,
                port,
                home,
            },
        })?;

        match command {
            Command::Init(args) => commands::init::run(&app, args).await,
            Command::Cancel(args) => commands::cancel::run(&app, args).await,
            Command::Renew(args) => commands::renew::run(&app, args).await,
            Command::Destroy(args) => commands::destroy::run(&app, args).await,
            Command::Ssh(args) => commands::ssh::run(&app, args).await,
            Command::Push(args) => commands::push::run(&app, args).await,
            Command::Pull(args) => commands::pull::run(&app, args).await,
            Command::Status(args) => commands::status::run(&app, &args).await,
            Command::Metrics(args) => commands::metrics::run(&app, &args).await,
            Command::DbInfo => commands::db::info(&app).await,
            Command::Psql(args) => commands::db::psql(&app, args).await,
            Command::RedisCli(args) => commands::db::redis_cli(&app, args).await,
            Command::Restore(args) => commands::restore::run(&app, args).await,
            Command::Deploy(args) => commands::deploy::run(&app, args).await,
            Command::Logs(args) => commands::logs::run(&app, args).await,
            Command::Exec(args) => commands::exec::run(&app, args).await,
            Command::Daemon(argv) => commands::daemon::run(&app, argv).await,
        }
    }
}
