//! Infrastructure implementation of the `ApplianceStore` port.
//!
//! State for an appliance lives in `<home>/<host>/`:
//!
//! | file             | content                          | mode |
//! |------------------|----------------------------------|------|
//! | `ID`             | machine id                       |      |
//! | `IPv4`           | assigned address                 |      |
//! | `known_hosts`    | pinned host key line             |      |
//! | `id_ed25519`     | OpenSSH private key              | 0600 |
//! | `id_ed25519.pub` | authorized key line              | 0600 |
//!
//! The directory is assembled in a staging directory next to it and renamed
//! into place, so readers see either nothing or all five files. Removal is
//! the reverse: rename away, then delete.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::ports::{ApplianceRecord, ApplianceStore};
use crate::domain::endpoint::USERNAME;
use crate::domain::{ApplianceError, HostIdentity, RemoteEndpoint};

const ID_FILE: &str = "ID";
const IPV4_FILE: &str = "IPv4";
const KNOWN_HOSTS_FILE: &str = "known_hosts";
pub const PRIVATE_KEY_FILE: &str = "id_ed25519";
const PUBLIC_KEY_FILE: &str = "id_ed25519.pub";

/// Filesystem-backed appliance state.
#[derive(Debug, Clone)]
pub struct ApplianceDir {
    home: PathBuf,
    host: String,
}

impl ApplianceDir {
    #[must_use]
    pub fn new(home: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            host: host.into(),
        }
    }

    fn path(&self) -> PathBuf {
        self.home.join(&self.host)
    }

    /// Reads a one-line state file. A missing file means the appliance does
    /// not exist locally.
    fn read_line(&self, name: &str) -> Result<String, ApplianceError> {
        let path = self.path().join(name);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(s.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ApplianceError::NotFound(self.path()))
            }
            Err(e) => Err(ApplianceError::local_io(path, e)),
        }
    }

    fn save_sync(&self, record: &ApplianceRecord) -> Result<(), ApplianceError> {
        let dir = self.path();
        if dir.join(IPV4_FILE).exists() {
            return Err(ApplianceError::AlreadyExists(dir));
        }
        std::fs::create_dir_all(&self.home).map_err(|e| ApplianceError::local_io(&self.home, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".abx-")
            .tempdir_in(&self.home)
            .map_err(|e| ApplianceError::local_io(&self.home, e))?;
        let stage = staging.path();
        restrict_to_owner(stage)?;
        write_file(&stage.join(ID_FILE), format!("{}\n", record.machine_id).as_bytes(), false)?;
        write_file(&stage.join(IPV4_FILE), format!("{}\n", record.address).as_bytes(), false)?;
        write_file(
            &stage.join(KNOWN_HOSTS_FILE),
            format!("{}\n", record.identity.known_hosts_line()).as_bytes(),
            false,
        )?;
        write_file(&stage.join(PRIVATE_KEY_FILE), record.key_pair.private_key_pem(), true)?;
        write_file(
            &stage.join(PUBLIC_KEY_FILE),
            record.key_pair.authorized_key().as_bytes(),
            true,
        )?;

        // Leftovers of an earlier interrupted run never contain IPv4.
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| ApplianceError::local_io(&dir, e))?;
        }
        std::fs::rename(stage, &dir).map_err(|e| ApplianceError::local_io(&dir, e))?;
        debug!(dir = %dir.display(), "appliance state saved");
        Ok(())
    }

    fn remove_sync(&self) -> Result<(), ApplianceError> {
        let dir = self.path();
        if !dir.exists() {
            return Err(ApplianceError::NotFound(dir));
        }
        let trash = tempfile::Builder::new()
            .prefix(".abx-removed-")
            .tempdir_in(&self.home)
            .map_err(|e| ApplianceError::local_io(&self.home, e))?;
        std::fs::rename(&dir, trash.path().join(&self.host))
            .map_err(|e| ApplianceError::local_io(&dir, e))?;
        trash
            .close()
            .map_err(|e| ApplianceError::local_io(&self.home, e))?;
        debug!(dir = %dir.display(), "appliance state removed");
        Ok(())
    }

    fn endpoint_sync(&self, port: u16) -> Result<RemoteEndpoint, ApplianceError> {
        let address = self.read_line(IPV4_FILE)?;
        let known_hosts = self.read_line(KNOWN_HOSTS_FILE)?;
        let identity = HostIdentity::from_known_hosts(&known_hosts, &address, port)?;
        let key_path = self.path().join(PRIVATE_KEY_FILE);
        let private_key = std::fs::read(&key_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ApplianceError::NotFound(self.path()),
            _ => ApplianceError::local_io(&key_path, e),
        })?;
        Ok(RemoteEndpoint {
            address,
            port,
            user: USERNAME.to_string(),
            identity,
            private_key,
        })
    }
}

impl ApplianceStore for ApplianceDir {
    fn dir(&self) -> PathBuf {
        self.path()
    }

    fn exists(&self) -> bool {
        self.path().join(IPV4_FILE).exists()
    }

    async fn save(&self, record: &ApplianceRecord) -> Result<(), ApplianceError> {
        let store = self.clone();
        let record = record.clone();
        run_blocking(move || store.save_sync(&record)).await
    }

    async fn machine_id(&self) -> Result<String, ApplianceError> {
        let store = self.clone();
        run_blocking(move || store.read_line(ID_FILE)).await
    }

    async fn endpoint(&self, port: u16) -> Result<RemoteEndpoint, ApplianceError> {
        let store = self.clone();
        run_blocking(move || store.endpoint_sync(port)).await
    }

    async fn remove(&self) -> Result<(), ApplianceError> {
        let store = self.clone();
        run_blocking(move || store.remove_sync()).await
    }
}

async fn run_blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T, ApplianceError> + Send + 'static,
) -> Result<T, ApplianceError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApplianceError::local_io(PathBuf::new(), std::io::Error::other(e)))?
}

/// Owner-only access for the appliance directory. The home holding it is
/// left as it is.
fn restrict_to_owner(path: &Path) -> Result<(), ApplianceError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .map_err(|e| ApplianceError::local_io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

fn write_file(path: &Path, contents: &[u8], private: bool) -> Result<(), ApplianceError> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(if private { 0o600 } else { 0o640 });
    }
    #[cfg(not(unix))]
    let _ = private;
    let mut file = options
        .open(path)
        .map_err(|e| ApplianceError::local_io(path, e))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|e| ApplianceError::local_io(path, e))
}
