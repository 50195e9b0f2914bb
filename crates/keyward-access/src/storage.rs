//! File-backed repositories
//!
//! Each record lives in its own JSON file inside the data directory:
//!
//! ```text
//! data_dir/
//! ├── config.json
//! ├── gatekeeper.json
//! ├── salt.json
//! └── user.json
//! ```
//!
//! Writes go to a temporary file that is renamed over the target, so a
//! reader sees either the old or the new record.

use std::fs;
use std::path::{Path, PathBuf};

use keyward_core::{AccessError, Gatekeeper, SingleGatekeeperRepository, SingleUserRepository, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

type CoreResult<T> = keyward_core::Result<T>;

/// Gatekeeper file name
pub const GATEKEEPER_FILE: &str = "gatekeeper.json";
/// User file name
pub const USER_FILE: &str = "user.json";

/// Read a JSON record, `None` if the file does not exist
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path) -> CoreResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    let record = serde_json::from_str(&contents).map_err(|e| {
        AccessError::Storage(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    Ok(Some(record))
}

/// Write a JSON record atomically with owner-only permissions
pub(crate) fn write_record<T: Serialize>(path: &Path, record: &T) -> CoreResult<()> {
    let contents = serde_json::to_string_pretty(record)
        .map_err(|e| AccessError::Storage(format!("Failed to serialize: {}", e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&temp_path, path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn remove_record(path: &Path) -> CoreResult<()> {
    if path.exists() {
        fs::remove_file(path)?;
        debug!("Removed {}", path.display());
    }
    Ok(())
}

/// Gatekeeper stored in `gatekeeper.json`
#[derive(Debug, Clone)]
pub struct FileGatekeeperRepository {
    path: PathBuf,
}

impl FileGatekeeperRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Repository for the standard file inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(GATEKEEPER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SingleGatekeeperRepository for FileGatekeeperRepository {
    fn gatekeeper(&self) -> CoreResult<Option<Gatekeeper>> {
        read_record(&self.path)
    }

    fn save(&self, gatekeeper: &Gatekeeper) -> CoreResult<()> {
        write_record(&self.path, gatekeeper)
    }

    fn remove(&self, gatekeeper: &Gatekeeper) -> CoreResult<()> {
        match self.gatekeeper()? {
            Some(stored) if stored.id() == gatekeeper.id() => remove_record(&self.path),
            _ => Ok(()),
        }
    }
}

/// Primary user stored in `user.json`
#[derive(Debug, Clone)]
pub struct FileUserRepository {
    path: PathBuf,
}

impl FileUserRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Repository for the standard file inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(USER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SingleUserRepository for FileUserRepository {
    fn primary_user(&self) -> CoreResult<Option<User>> {
        read_record(&self.path)
    }

    fn save(&self, user: &User) -> CoreResult<()> {
        write_record(&self.path, user)
    }

    fn remove(&self, user: &User) -> CoreResult<()> {
        match self.primary_user()? {
            Some(stored) if stored.id() == user.id() => remove_record(&self.path),
            _ => Ok(()),
        }
    }
}
