//! Appliance endpoint and pinned host identity.
//!
//! This module is intentionally free of I/O; parsing of the actual key bytes
//! happens in the SSH adapter.

use crate::domain::error::{ApplianceError, AuthFailure};

/// Login user on the appliance, also the default appliance name.
pub const USERNAME: &str = "acrobox";

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Host public key pinned at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    /// `address`, or `[address]:port` for non-default ports.
    pub host: String,
    /// Key algorithm, e.g. `ssh-ed25519`.
    pub key_type: String,
    /// Base64 wire encoding of the key.
    pub key_base64: String,
}

impl HostIdentity {
    /// Pins `authorized_key` (`<type> <base64> [comment]`) for `address:port`.
    ///
    /// # Errors
    ///
    /// Returns `AuthFailure::InvalidKey` if the key line is malformed.
    pub fn new(address: &str, port: u16, authorized_key: &str) -> Result<Self, ApplianceError> {
        let (key_type, key_base64) = split_key(authorized_key)?;
        Ok(Self {
            host: known_hosts_host(address, port),
            key_type,
            key_base64,
        })
    }

    /// Finds the pinned entry for `address:port` in known_hosts content.
    ///
    /// # Errors
    ///
    /// Returns `AuthFailure::InvalidKey` if no line names this host.
    pub fn from_known_hosts(
        content: &str,
        address: &str,
        port: u16,
    ) -> Result<Self, ApplianceError> {
        let host = known_hosts_host(address, port);
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((hosts, key)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            if hosts.split(',').any(|h| h == host) {
                let (key_type, key_base64) = split_key(key)?;
                return Ok(Self {
                    host,
                    key_type,
                    key_base64,
                });
            }
        }
        Err(ApplianceError::Auth(AuthFailure::InvalidKey(format!(
            "no pinned host key for {host}"
        ))))
    }

    /// One `known_hosts` line, without trailing newline.
    #[must_use]
    pub fn known_hosts_line(&self) -> String {
        format!("{} {} {}", self.host, self.key_type, self.key_base64)
    }
}

/// Everything needed to open a session to the appliance.
#[derive(Clone)]
pub struct RemoteEndpoint {
    pub address: String,
    pub port: u16,
    pub user: String,
    pub identity: HostIdentity,
    /// PEM-encoded private key used for authentication.
    pub private_key: Vec<u8>,
}

impl RemoteEndpoint {
    /// `address:port` suitable for dialing, bracketing IPv6 literals.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        join_host_port(&self.address, self.port)
    }
}

impl std::fmt::Debug for RemoteEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEndpoint")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("identity", &self.identity.host)
            .finish_non_exhaustive()
    }
}

#[must_use]
pub fn join_host_port(address: &str, port: u16) -> String {
    if address.contains(':') {
        format!("[{address}]:{port}")
    } else {
        format!("{address}:{port}")
    }
}

fn known_hosts_host(address: &str, port: u16) -> String {
    if port == DEFAULT_SSH_PORT {
        address.to_string()
    } else {
        format!("[{address}]:{port}")
    }
}

fn split_key(line: &str) -> Result<(String, String), ApplianceError> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some(key_type), Some(material)) => Ok((key_type.to_string(), material.to_string())),
        _ => Err(ApplianceError::Auth(AuthFailure::InvalidKey(format!(
            "malformed public key line {line:?}"
        )))),
    }
}
