//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;

use crate::domain::machine::{DestroyRequest, Machine, MachineRequest};
use crate::domain::{ApplianceError, HostIdentity, KeyPair, RemoteEndpoint, TransferEntry};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Buffered result of a remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: u32,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Pseudo-terminal parameters forwarded to the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyRequest {
    pub term: String,
    pub cols: u32,
    pub rows: u32,
    /// Whether the remote terminal should echo input.
    pub echo: bool,
}

/// Standard input streamed to a buffered command.
pub type Stdin<'a> = &'a mut (dyn AsyncRead + Unpin + Send);

/// Everything persisted locally for a provisioned appliance.
#[derive(Debug, Clone)]
pub struct ApplianceRecord {
    pub machine_id: String,
    pub address: String,
    pub identity: HostIdentity,
    pub key_pair: KeyPair,
}

// ── Session Ports ─────────────────────────────────────────────────────────────

/// A single-use authenticated remote shell.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Run `command`, buffering stdout and stderr independently.
    ///
    /// A non-zero exit is reported in `CommandOutput::exit_code`, not as an
    /// error; errors are transport failures only.
    async fn run(
        &mut self,
        command: &str,
        stdin: Option<Stdin<'_>>,
    ) -> Result<CommandOutput, ApplianceError>;

    /// Allocate a remote pseudo-terminal for the next interactive command.
    async fn request_pty(&mut self, pty: &PtyRequest) -> Result<(), ApplianceError>;

    /// Run `command` with the local stdio attached and return its exit status.
    async fn run_interactive(&mut self, command: &str) -> Result<u32, ApplianceError>;

    /// Start a login shell with the local stdio attached.
    async fn shell(&mut self) -> Result<u32, ApplianceError>;

    /// Tear the connection down.
    async fn close(self) -> Result<(), ApplianceError>;
}

/// Opens sessions to an endpoint. Never pools or shares connections.
#[allow(async_fn_in_trait)]
pub trait SessionFactory {
    type Session: Session;

    /// Dial, verify the pinned host key, and authenticate with the stored key.
    ///
    /// # Errors
    ///
    /// `Transport` for dial/handshake failures or timeouts, `Auth` for a host
    /// key mismatch or a rejected key.
    async fn open_session(&self, endpoint: &RemoteEndpoint)
    -> Result<Self::Session, ApplianceError>;
}

/// Local terminal control for interactive sessions.
pub trait LocalTerminal {
    /// Restores the terminal when dropped.
    type Guard;

    /// When stdin is a terminal, disable echo (raw mode) and return the guard
    /// with the current `(cols, rows)`. Returns `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `LocalIo` if the terminal mode or size cannot be read.
    fn acquire(&self) -> Result<Option<(Self::Guard, (u16, u16))>, ApplianceError>;
}

// ── Provisioning Ports ────────────────────────────────────────────────────────

/// Remote provisioning service (request/cancel/renew/destroy machines).
#[allow(async_fn_in_trait)]
pub trait ProvisioningService {
    /// Request a new machine and return its id.
    async fn request_machine(&self, request: &MachineRequest) -> Result<String, ApplianceError>;
    async fn get_machine(&self, id: &str) -> Result<Machine, ApplianceError>;
    async fn cancel_machine(&self, id: &str) -> Result<(), ApplianceError>;
    async fn renew_machine(&self, id: &str) -> Result<(), ApplianceError>;
    async fn destroy_machine(&self, id: &str, request: &DestroyRequest)
    -> Result<(), ApplianceError>;
}

/// Network connectivity checks, mockable in tests.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// Check TCP connectivity to the given host and port.
    async fn check_tcp_connectivity(&self, host: &str, port: u16) -> Result<bool, ApplianceError>;
}

// ── State and Filesystem Ports ────────────────────────────────────────────────

/// Per-appliance local state: machine id, address, pinned host key, key pair.
#[allow(async_fn_in_trait)]
pub trait ApplianceStore {
    /// Directory holding this appliance's state.
    fn dir(&self) -> PathBuf;

    /// Returns `true` once the address has been recorded.
    fn exists(&self) -> bool;

    /// Persist all state as one unit.
    async fn save(&self, record: &ApplianceRecord) -> Result<(), ApplianceError>;

    async fn machine_id(&self) -> Result<String, ApplianceError>;

    /// Load the endpoint used to open sessions.
    async fn endpoint(&self, port: u16) -> Result<RemoteEndpoint, ApplianceError>;

    /// Remove all state as one unit.
    async fn remove(&self) -> Result<(), ApplianceError>;
}

/// Local side of a file transfer.
#[allow(async_fn_in_trait)]
pub trait LocalFs {
    type Reader: AsyncRead + Unpin + Send;

    fn is_dir(&self, path: &Path) -> bool;

    /// Pre-order listing of `root`: the root first (empty relative path), then
    /// every descendant with its `/`-separated path relative to `root`.
    fn walk(&self, root: &Path) -> Result<Vec<TransferEntry>, ApplianceError>;

    async fn open(&self, path: &Path) -> Result<Self::Reader, ApplianceError>;

    async fn create_dir_all(&self, path: &Path) -> Result<(), ApplianceError>;

    /// Write `contents`, creating parent directories and truncating.
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), ApplianceError>;
}

/// Local container engine, used to export images for deployment.
#[allow(async_fn_in_trait)]
pub trait ImageExporter {
    /// Write `image` as an archive at `archive`, replacing its contents.
    async fn save(&self, image: &str, archive: &Path) -> Result<(), ApplianceError>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
