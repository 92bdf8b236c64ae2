//! Application service: cancel, renew and destroy a provisioned machine.
//!
//! The machine id always comes from local state; a missing state directory
//! surfaces as `NotFound` before the provisioning service is contacted.

use crate::application::ports::{ApplianceStore, ProvisioningService};
use crate::domain::ApplianceError;
use crate::domain::machine::DestroyRequest;

/// Cancel the subscription for the stored machine.
///
/// # Errors
///
/// `NotFound` without local state, `Service` if the request is refused.
pub async fn cancel(
    service: &impl ProvisioningService,
    store: &impl ApplianceStore,
) -> Result<(), ApplianceError> {
    let id = store.machine_id().await?;
    service.cancel_machine(&id).await
}

/// Renew the subscription for the stored machine.
///
/// # Errors
///
/// `NotFound` without local state, `Service` if the request is refused.
pub async fn renew(
    service: &impl ProvisioningService,
    store: &impl ApplianceStore,
) -> Result<(), ApplianceError> {
    let id = store.machine_id().await?;
    service.renew_machine(&id).await
}

/// Destroy the stored machine, then remove all of its local state as one unit.
///
/// Local state is kept when the service refuses, so the command can be
/// retried.
///
/// # Errors
///
/// `NotFound` without local state, `Service` if the request is refused,
/// `LocalIo` if local state cannot be removed.
pub async fn destroy(
    service: &impl ProvisioningService,
    store: &impl ApplianceStore,
    request: &DestroyRequest,
) -> Result<(), ApplianceError> {
    let id = store.machine_id().await?;
    service.destroy_machine(&id, request).await?;
    store.remove().await
}
