//! Local docker CLI: implements `ImageExporter` with `docker save`.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tracing::debug;

use crate::application::ports::ImageExporter;
use crate::domain::ApplianceError;

/// The `docker` binary on `PATH`.
pub struct DockerCli {
    program: OsString,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::with_program("docker")
    }
}

impl DockerCli {
    #[must_use]
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ImageExporter for DockerCli {
    async fn save(&self, image: &str, archive: &Path) -> Result<(), ApplianceError> {
        debug!(image, archive = %archive.display(), "exporting image");
        // Progress and errors go straight to the user's terminal.
        let status = tokio::process::Command::new(&self.program)
            .arg("save")
            .arg(image)
            .arg("-o")
            .arg(archive)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| ApplianceError::local_io(archive, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(ApplianceError::local_io(
                archive,
                std::io::Error::other(format!("docker save {image} failed ({status})")),
            ))
        }
    }
}
