//! Domain layer: pure types, encoders and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod containers;
pub mod endpoint;
pub mod error;
pub mod keypair;
pub mod machine;
pub mod provisioning;
pub mod quote;
pub mod transfer;

pub use endpoint::{HostIdentity, RemoteEndpoint};
pub use error::{ApplianceError, AuthFailure};
pub use keypair::KeyPair;
pub use provisioning::{ProvisioningState, RetryPolicy, Stage};
pub use transfer::{EntryKind, TransferEntry};
