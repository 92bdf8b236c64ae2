//! Transfer entries and the remote shell commands a transfer issues.
//!
//! Remote paths are always POSIX strings, independent of the local platform.

use crate::domain::quote::quote_arg;

/// Kind of a filesystem entry on either side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Classifies the output of `stat -L -c %F`.
    #[must_use]
    pub fn from_stat_output(output: &[u8]) -> Self {
        if output.trim_ascii() == b"directory" {
            Self::Directory
        } else {
            Self::File
        }
    }
}

/// One entry of a tree being mirrored across the remote boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEntry {
    /// Path relative to the transfer root, `/`-separated; empty for the root.
    pub relative_path: String,
    pub kind: EntryKind,
}

/// Joins a remote directory and a relative `/`-separated path.
#[must_use]
pub fn remote_join(base: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return base.to_string();
    }
    if base.ends_with('/') {
        format!("{base}{relative}")
    } else {
        format!("{base}/{relative}")
    }
}

/// Final component of a remote path, ignoring trailing slashes.
///
/// `None` for the root, `.` and `..`: none of them names an entry that can
/// be created inside a local directory.
#[must_use]
pub fn remote_base_name(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    match base {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

/// Remote path with trailing slashes removed (the root stays `/`).
#[must_use]
pub fn trim_remote_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// File type query following symbolic links.
#[must_use]
pub fn stat_command(path: &str) -> String {
    format!("stat -L -c %F {}", quote_arg(path))
}

/// Writes standard input to `path`, truncating any existing file.
#[must_use]
pub fn write_command(path: &str) -> String {
    format!("sh -c {}", quote_arg(&format!("cat > {}", quote_arg(path))))
}

/// Emits the file at `path` on standard output.
#[must_use]
pub fn read_command(path: &str) -> String {
    format!("cat {}", quote_arg(path))
}

#[must_use]
pub fn mkdir_command(path: &str) -> String {
    format!("mkdir -p {}", quote_arg(path))
}

/// Lists the direct children of `path`, one per line. A symbolic link given
/// as `path` is followed; links below it are listed, not descended into.
#[must_use]
pub fn list_command(path: &str) -> String {
    format!("find -H {} -mindepth 1 -maxdepth 1", quote_arg(path))
}
