//! Password transformation with Argon2id
//!
//! Users are looked up by their encrypted password, so the transformation
//! must be deterministic. A random salt generated once per installation and
//! stored in `salt.json` keeps the output unique to this data directory. The
//! Argon2 parameters are stored next to the salt and never change afterwards.

use std::path::Path;

use argon2::{Algorithm, Argon2, Params, Version};
use keyward_core::{AccessError, EncryptedPassword, EncryptionService};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::KdfConfig;
use crate::error::{AppError, Result};
use crate::storage::{read_record, write_record};

/// Salt file name
pub const SALT_FILE: &str = "salt.json";

/// Current salt file format; version 1 did not store the Argon2 parameters
const SALT_VERSION: u32 = 2;

/// Length of the derived value in bytes
const OUTPUT_LENGTH: usize = 32;

/// Random per-installation salt
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct InstallationSalt([u8; 32]);

/// Salt storage format (persisted to disk)
#[derive(Serialize, Deserialize)]
struct SaltStorage {
    #[serde(with = "hex_salt")]
    salt: [u8; 32],
    /// Parameters the stored passwords were derived with
    #[serde(default)]
    kdf: Option<KdfConfig>,
    /// Version for future migrations
    version: u32,
}

mod hex_salt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes.try_into().map_err(|_| serde::de::Error::custom("invalid salt length"))
    }
}

impl InstallationSalt {
    pub fn generate() -> Self {
        let mut salt = [0u8; 32];
        OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Load the salt and its Argon2 parameters from `path`
    ///
    /// On first use a salt is generated and saved together with `kdf`. Once
    /// saved, the stored parameters win over `kdf`. A version 1 file without
    /// parameters is upgraded in place with `kdf`.
    pub fn load_or_create(path: &Path, kdf: &KdfConfig) -> Result<(Self, KdfConfig)> {
        match read_record::<SaltStorage>(path)? {
            Some(SaltStorage {
                salt,
                kdf: Some(stored),
                ..
            }) => {
                if stored != *kdf {
                    warn!(
                        "Ignoring configured Argon2 parameters, installation keeps {:?}",
                        stored
                    );
                }
                Ok((Self(salt), stored))
            }
            Some(SaltStorage { salt, kdf: None, .. }) => {
                Self::save(path, salt, kdf)?;
                info!("Stored Argon2 parameters in {:?}", path);
                Ok((Self(salt), kdf.clone()))
            }
            None => {
                let salt = Self::generate();
                Self::save(path, salt.0, kdf)?;
                info!("Generated installation salt at {:?}", path);
                Ok((salt, kdf.clone()))
            }
        }
    }

    fn save(path: &Path, salt: [u8; 32], kdf: &KdfConfig) -> Result<()> {
        let storage = SaltStorage {
            salt,
            kdf: Some(kdf.clone()),
            version: SALT_VERSION,
        };
        write_record(path, &storage)?;
        Ok(())
    }
}

impl std::fmt::Debug for InstallationSalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InstallationSalt(..)")
    }
}

/// Deterministic Argon2id password transformation
pub struct Argon2EncryptionService {
    argon2: Argon2<'static>,
    salt: InstallationSalt,
}

impl Argon2EncryptionService {
    pub fn new(salt: InstallationSalt, kdf: &KdfConfig) -> Result<Self> {
        let output_len = Some(OUTPUT_LENGTH);
        let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, output_len)
            .map_err(|e| AppError::Config(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            salt,
        })
    }

    /// Service using the salt and parameters stored in `data_dir`
    ///
    /// `kdf` only applies when the installation is created.
    pub fn in_dir(data_dir: &Path, kdf: &KdfConfig) -> Result<Self> {
        let (salt, stored) = InstallationSalt::load_or_create(&data_dir.join(SALT_FILE), kdf)?;
        Self::new(salt, &stored)
    }
}

impl EncryptionService for Argon2EncryptionService {
    fn encrypted(&self, plaintext: &str) -> keyward_core::Result<EncryptedPassword> {
        let password = Zeroizing::new(plaintext.as_bytes().to_vec());
        let mut output = Zeroizing::new([0u8; OUTPUT_LENGTH]);
        self.argon2
            .hash_password_into(&password, self.salt.as_bytes(), &mut output[..])
            .map_err(|e| AccessError::Encryption(format!("Key derivation failed: {}", e)))?;
        Ok(EncryptedPassword::new(hex::encode(&output[..])))
    }
}
