//! Error types for the application layer

use keyward_core::AccessError;
use thiserror::Error;

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum AppError {
    /// Domain error
    #[error("{0}")]
    Core(#[from] AccessError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Password request with an empty password
    #[error("Password must not be empty")]
    EmptyPassword,

    /// Operation needs a current session
    #[error("No session - authenticate first")]
    MissingSession,
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl AppError {
    /// Whether the error is a missing gatekeeper, i.e. authentication was never configured
    pub fn is_not_configured(&self) -> bool {
        matches!(self, AppError::Core(AccessError::GatekeeperNotFound))
    }
}
