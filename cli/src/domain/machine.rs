//! Provisioning service request and response types.

use serde::{Deserialize, Serialize};

/// Product ordered for every appliance.
pub const PRODUCT: &str = "Indie Hacker";

/// Body of a machine request.
#[derive(Debug, Clone, Serialize)]
pub struct MachineRequest {
    pub product: String,
    pub name: String,
    pub region: String,
    pub size: String,
    /// Data volume size in GB.
    pub data_size: u32,
    /// Authorized key line installed for the login user.
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Machine as reported by the provisioning service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Machine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Empty until the network has been assigned.
    #[serde(default)]
    pub ipv4: String,
    /// Host public key in authorized-key form.
    #[serde(default)]
    pub public_key: String,
}

impl Machine {
    /// Returns `true` once the service reports an address.
    #[must_use]
    pub fn has_address(&self) -> bool {
        !self.ipv4.trim().is_empty()
    }
}

/// Body of a destroy request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DestroyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Error document returned by the provisioning service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}
