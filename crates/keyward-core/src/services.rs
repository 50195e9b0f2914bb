//! External capabilities consumed by the identity service
//!
//! The password hashing algorithm and the platform biometric prompt live
//! outside this crate; only their contracts are defined here.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::user::EncryptedPassword;

/// One-way password transformation used for storage and comparison
///
/// Must be deterministic: the same plaintext always yields the same value,
/// since users are looked up by their encrypted password.
pub trait EncryptionService: Send + Sync {
    fn encrypted(&self, plaintext: &str) -> Result<EncryptedPassword>;
}

/// Kind of biometry offered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometryType {
    #[default]
    None,
    TouchId,
    FaceId,
}

/// Platform biometric prompt
pub trait BiometricAuthenticationService: Send + Sync {
    /// Whether a biometric prompt can currently be shown
    fn is_authentication_available(&self) -> bool;

    fn biometry_type(&self) -> BiometryType;

    /// Ask the user to enable biometry after registration
    fn activate(&self) -> Result<()>;

    /// Prompt for biometric authentication; `Ok(false)` when declined or failed
    fn authenticate(&self) -> Result<bool>;
}
