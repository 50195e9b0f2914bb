//! Error types for the Keyward core

use thiserror::Error;

use crate::gatekeeper::GatekeeperError;
use crate::identity::RegistrationError;
use crate::policy::PolicyError;
use crate::session::SessionError;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, AccessError>;

/// Errors surfaced by the identity service and its collaborators
#[derive(Debug, Error)]
pub enum AccessError {
    /// Authentication policy values were rejected
    #[error("Invalid policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    /// Session operation called outside its valid state
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Gatekeeper refused the operation
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(#[from] GatekeeperError),

    /// Registration input rejected
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// No gatekeeper was ever created - a configuration error, not an authentication failure
    #[error("Gatekeeper not found - authentication is not configured")]
    GatekeeperNotFound,

    /// Malformed identifier
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Repository failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encryption capability failure
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Biometric capability failure
    #[error("Biometry error: {0}")]
    Biometry(String),

    /// Encoding or decoding of persisted state failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AccessError {
    fn from(e: serde_json::Error) -> Self {
        AccessError::Serialization(e.to_string())
    }
}

impl AccessError {
    /// Whether the error is the lockout signal rather than a protocol or storage fault
    pub fn is_access_blocked(&self) -> bool {
        matches!(self, AccessError::Gatekeeper(GatekeeperError::AccessBlocked))
    }
}
