//! Typed error classification for appliance operations.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, or `tokio`. Every port and service returns
//! `ApplianceError` so callers can match on the failure kind instead of
//! inspecting error chains.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::provisioning::Stage;

/// Reason a session was refused during authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The server presented a host key that differs from the pinned one.
    HostKeyMismatch { host: String },
    /// The server rejected our private key.
    KeyRejected { user: String },
    /// The stored private key or pinned host key could not be parsed.
    InvalidKey(String),
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HostKeyMismatch { host } => {
                write!(f, "host key for {host} does not match the pinned identity")
            }
            Self::KeyRejected { user } => write!(f, "public key rejected for user '{user}'"),
            Self::InvalidKey(reason) => write!(f, "invalid key material: {reason}"),
        }
    }
}

/// Errors surfaced by key generation, sessions, commands, transfers and
/// provisioning.
#[derive(Debug, Error)]
pub enum ApplianceError {
    #[error("key encoding failed: {0}")]
    Encoding(String),

    #[error("connection failed: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(AuthFailure),

    #[error("remote command exited with status {code}")]
    Command { code: u32, stderr: Vec<u8> },

    #[error("{}", .0.timeout_message())]
    Timeout(Stage),

    #[error("{}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),

    #[error("provisioning service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Machine '{}' does not exist.", .0.display())]
    NotFound(PathBuf),

    #[error("Machine '{}' already exists.", .0.display())]
    AlreadyExists(PathBuf),
}

impl ApplianceError {
    /// Wraps a local filesystem error with the path it concerns.
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for failures a provisioning stage may retry.
    ///
    /// Host key mismatches and rejected keys are never transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Command { .. })
    }

    /// Exit code of a failed remote command, if this is one.
    #[must_use]
    pub fn exit_code(&self) -> Option<u32> {
        match self {
            Self::Command { code, .. } => Some(*code),
            _ => None,
        }
    }
}
