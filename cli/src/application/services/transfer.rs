//! File transfer built only from remote shell commands.
//!
//! There is no transfer primitive on the remote side: files go up as the
//! standard input of `cat > path`, come down as the standard output of
//! `cat path`, and directory trees are mirrored with `mkdir -p`, `find` and
//! `stat`. Nothing is checksummed or resumable; a retry overwrites whatever a
//! failed attempt left behind.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::ports::{LocalFs, SessionFactory};
use crate::application::services::executor::CommandExecutor;
use crate::domain::transfer::{
    list_command, mkdir_command, read_command, remote_base_name, remote_join, stat_command,
    trim_remote_dir, write_command,
};
use crate::domain::{ApplianceError, EntryKind};

const MULTI_SOURCE_USAGE: &str =
    "target must be an existing directory when more than one source is given";

/// Push and pull between the local filesystem and the appliance.
pub struct FileTransfer<'a, F, L> {
    remote: &'a CommandExecutor<'a, F>,
    local: &'a L,
}

impl<'a, F: SessionFactory, L: LocalFs> FileTransfer<'a, F, L> {
    #[must_use]
    pub fn new(remote: &'a CommandExecutor<'a, F>, local: &'a L) -> Self {
        Self { remote, local }
    }

    /// Copy local `sources` to the remote `target`.
    ///
    /// When `target` is an existing remote directory every source lands inside
    /// it under its own name; otherwise exactly one source is accepted and is
    /// written to `target` itself.
    ///
    /// # Errors
    ///
    /// `Usage` for several sources without a target directory, `LocalIo` for
    /// unreadable sources, and any error from the remote commands.
    pub async fn push(&self, sources: &[PathBuf], target: &str) -> Result<(), ApplianceError> {
        if sources.is_empty() {
            return Err(ApplianceError::Usage("no source given".into()));
        }
        let target_is_dir = self.remote_kind(target).await? == Some(EntryKind::Directory);
        if !target_is_dir && sources.len() > 1 {
            return Err(ApplianceError::Usage(MULTI_SOURCE_USAGE.into()));
        }
        for source in sources {
            self.push_one(source, target, target_is_dir).await?;
        }
        Ok(())
    }

    /// Copy remote `sources` to the local `target`.
    ///
    /// Mirrors [`FileTransfer::push`]: sources land inside `target` when it is
    /// an existing local directory, otherwise the single source becomes
    /// `target`. A source without a name of its own (`/`, `.`, `..`) is
    /// copied into `target` itself, never beside or above it.
    ///
    /// # Errors
    ///
    /// `Usage` for several sources without a target directory, `Command` when
    /// a remote path cannot be read, `LocalIo` when writing fails.
    pub async fn pull(&self, sources: &[String], target: &Path) -> Result<(), ApplianceError> {
        if sources.is_empty() {
            return Err(ApplianceError::Usage("no source given".into()));
        }
        let target_is_dir = self.local.is_dir(target);
        if !target_is_dir && sources.len() > 1 {
            return Err(ApplianceError::Usage(MULTI_SOURCE_USAGE.into()));
        }
        for source in sources {
            let dest = match remote_base_name(source) {
                Some(name) if target_is_dir => target.join(name),
                _ => target.to_path_buf(),
            };
            self.pull_one(source, &dest).await?;
        }
        Ok(())
    }

    /// Remote file type, following symlinks. `None` when the path does not
    /// exist (`stat` exits 1).
    async fn remote_kind(&self, path: &str) -> Result<Option<EntryKind>, ApplianceError> {
        match self.remote.run(&stat_command(path)).await {
            Ok(output) => Ok(Some(EntryKind::from_stat_output(&output.stdout))),
            Err(ApplianceError::Command { code: 1, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn push_one(
        &self,
        source: &Path,
        target: &str,
        target_is_dir: bool,
    ) -> Result<(), ApplianceError> {
        let name = local_name(source)?;
        let dest = if target_is_dir {
            remote_join(target, &name)
        } else {
            target.to_string()
        };
        if self.local.is_dir(source) {
            self.push_dir(source, &dest).await
        } else {
            self.push_file(source, &dest).await
        }
    }

    async fn push_file(&self, source: &Path, dest: &str) -> Result<(), ApplianceError> {
        debug!(source = %source.display(), dest, "push file");
        let mut reader = self.local.open(source).await?;
        self.remote
            .run_with_stdin(&write_command(dest), &mut reader)
            .await?;
        Ok(())
    }

    /// Walks `source` in pre-order so every directory is created before
    /// anything is pushed into it.
    async fn push_dir(&self, source: &Path, dest: &str) -> Result<(), ApplianceError> {
        for entry in self.local.walk(source)? {
            let remote = remote_join(dest, &entry.relative_path);
            match entry.kind {
                EntryKind::Directory => {
                    debug!(dest = remote, "create remote directory");
                    self.remote.run(&mkdir_command(&remote)).await?;
                }
                EntryKind::File => {
                    let local = local_join(source, &entry.relative_path);
                    self.push_file(&local, &remote).await?;
                }
            }
        }
        Ok(())
    }

    async fn pull_one(&self, source: &str, dest: &Path) -> Result<(), ApplianceError> {
        match self.remote_kind(source).await? {
            Some(EntryKind::Directory) => self.pull_dir(trim_remote_dir(source), dest).await,
            _ => self.pull_file(source, dest).await,
        }
    }

    async fn pull_file(&self, source: &str, dest: &Path) -> Result<(), ApplianceError> {
        debug!(source, dest = %dest.display(), "pull file");
        let output = self.remote.run(&read_command(source)).await?;
        self.local.write(dest, &output.stdout).await
    }

    /// One listing per directory; only direct children are handled here and
    /// each child directory recurses with its own listing.
    async fn pull_dir(&self, source: &str, dest: &Path) -> Result<(), ApplianceError> {
        let listing = self.remote.run(&list_command(source)).await?;
        self.local.create_dir_all(dest).await?;
        let listing = String::from_utf8_lossy(&listing.stdout);
        for child in listing.lines().filter(|p| is_direct_child(source, p)) {
            let Some(name) = remote_base_name(child) else {
                debug!(child, "skipping entry without a local name");
                continue;
            };
            Box::pin(self.pull_one(child, &dest.join(name))).await?;
        }
        Ok(())
    }
}

fn is_direct_child(dir: &str, path: &str) -> bool {
    let prefix = if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{dir}/")
    };
    path.strip_prefix(&prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

fn local_name(path: &Path) -> Result<String, ApplianceError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ApplianceError::Usage(format!("cannot determine a file name for '{}'", path.display()))
        })
}

fn local_join(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|c| !c.is_empty())
        .fold(root.to_path_buf(), |acc, c| acc.join(c))
}
