//! Filesystem infrastructure: implements the `LocalFs` port for transfers.

use std::path::Path;

use walkdir::WalkDir;

use crate::application::ports::LocalFs;
use crate::domain::{ApplianceError, EntryKind, TransferEntry};

/// Production filesystem implementation of `LocalFs`.
pub struct HostFs;

impl LocalFs for HostFs {
    type Reader = tokio::fs::File;

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn walk(&self, root: &Path) -> Result<Vec<TransferEntry>, ApplianceError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                ApplianceError::local_io(path, source)
            })?;
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let relative_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let kind = if entry.file_type().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(TransferEntry {
                relative_path,
                kind,
            });
        }
        Ok(entries)
    }

    async fn open(&self, path: &Path) -> Result<Self::Reader, ApplianceError> {
        tokio::fs::File::open(path)
            .await
            .map_err(|e| ApplianceError::local_io(path, e))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), ApplianceError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| ApplianceError::local_io(path, e))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), ApplianceError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| ApplianceError::local_io(path, e))
    }
}
