//! Access configuration
//!
//! Stored as `config.json` inside the data directory. The policy section
//! seeds the gatekeeper on `init`; later changes go through the
//! `configure` commands and live in the gatekeeper record itself.

use std::fs;
use std::path::{Path, PathBuf};

use keyward_core::types::{duration_as_secs_f64, duration_from_secs_f64};
use keyward_core::{
    AccessError, AuthenticationPolicy, DEFAULT_BLOCK_DURATION_SECS, DEFAULT_MAX_FAILED_ATTEMPTS,
    DEFAULT_SESSION_DURATION_SECS,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};

/// Configuration file name inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// Access configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Directory holding the gatekeeper, user and salt files
    pub data_dir: PathBuf,

    /// Policy installed when the gatekeeper is created
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Argon2id cost parameters for a new installation
    ///
    /// Pinned in `salt.json` when the salt is generated; later edits here do
    /// not affect an existing installation.
    #[serde(default)]
    pub kdf: KdfConfig,
}

/// Authentication policy in file form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Session length (seconds)
    pub session_duration_secs: f64,

    /// Failed attempts before authentication is blocked
    pub max_failed_attempts: u32,

    /// Block period after the last failed attempt (seconds)
    pub block_duration_secs: f64,
}

/// Argon2id cost parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            policy: PolicyConfig::default(),
            kdf: KdfConfig::default(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            session_duration_secs: DEFAULT_SESSION_DURATION_SECS as f64,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            block_duration_secs: DEFAULT_BLOCK_DURATION_SECS as f64,
        }
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl AccessConfig {
    /// Get the default data directory
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyward")
    }

    /// Create config with custom data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load `config.json` from `data_dir`, writing the defaults on first use
    ///
    /// The directory the file was found in wins over the stored `data_dir`,
    /// so a data directory can be moved as a whole.
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            let config = Self::with_data_dir(data_dir);
            config.ensure_directories()?;
            config.save(&path)?;
            info!("Created default config at {:?}", path);
            config
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    /// Create directories if they don't exist
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }
}

impl PolicyConfig {
    /// Validate into a domain policy
    pub fn to_policy(&self) -> Result<AuthenticationPolicy> {
        let session_duration = duration_from_secs_f64(self.session_duration_secs)
            .ok_or_else(|| AppError::Config("session_duration_secs out of range".into()))?;
        let block_duration = duration_from_secs_f64(self.block_duration_secs)
            .ok_or_else(|| AppError::Config("block_duration_secs out of range".into()))?;
        let policy =
            AuthenticationPolicy::new(session_duration, self.max_failed_attempts, block_duration)
                .map_err(AccessError::from)?;
        Ok(policy)
    }
}

impl From<&AuthenticationPolicy> for PolicyConfig {
    fn from(policy: &AuthenticationPolicy) -> Self {
        Self {
            session_duration_secs: duration_as_secs_f64(policy.session_duration()),
            max_failed_attempts: policy.max_failed_attempts(),
            block_duration_secs: duration_as_secs_f64(policy.block_duration()),
        }
    }
}
