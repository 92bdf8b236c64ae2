//! Application service: ship a locally built image to the appliance.
//!
//! The image is exported to a local archive, pushed into the remote staging
//! directory through [`FileTransfer`], loaded into the remote engine and
//! removed again.

use std::path::Path;

use tracing::info;

use crate::application::ports::{ImageExporter, LocalFs, SessionFactory};
use crate::application::services::executor::CommandExecutor;
use crate::application::services::transfer::FileTransfer;
use crate::domain::ApplianceError;
use crate::domain::containers::{IMAGE_STAGING_DIR, load_command};
use crate::domain::transfer::remote_join;

/// Export `image` to `archive`, then load it on the appliance.
///
/// # Errors
///
/// `LocalIo` when the export fails (nothing is sent), otherwise any error
/// from the push or the remote load.
pub async fn ship_image<E, F, L>(
    exporter: &E,
    remote: &CommandExecutor<'_, F>,
    local: &L,
    image: &str,
    archive: &Path,
) -> Result<(), ApplianceError>
where
    E: ImageExporter,
    F: SessionFactory,
    L: LocalFs,
{
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ApplianceError::Usage(format!("archive '{}' has no file name", archive.display()))
        })?;
    exporter.save(image, archive).await?;

    FileTransfer::new(remote, local)
        .push(&[archive.to_path_buf()], IMAGE_STAGING_DIR)
        .await?;
    let staged = remote_join(IMAGE_STAGING_DIR, &name);
    remote.run(&load_command(&staged)).await?;
    info!(image, "image loaded on the appliance");
    Ok(())
}
