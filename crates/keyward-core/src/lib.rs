//! Keyward Core - Authentication policy, sessions and the lockout gatekeeper
//!
//! This crate holds the access-control engine of a credential-holding client:
//! it decides, for an explicitly supplied point in time, whether the user may
//! unlock the application and enforces the brute-force lockout policy.
//!
//! # Model
//!
//! - [`AuthenticationPolicy`] - validated session length, failure threshold and block duration
//! - [`Session`] - time-windowed proof of a successful authentication
//! - [`Gatekeeper`] - aggregate owning the policy, the current session and failure state
//! - [`IdentityService`] - registration and authentication over injected collaborators
//!
//! Nothing in this crate reads a wall clock; every time-dependent operation
//! takes the current [`Timestamp`] from its caller.

pub mod error;
pub mod gatekeeper;
pub mod identity;
pub mod policy;
pub mod repository;
pub mod services;
pub mod session;
pub mod types;
pub mod user;

pub use error::{AccessError, Result};
pub use gatekeeper::{Gatekeeper, GatekeeperError};
pub use identity::{
    validate_password, IdentityContext, IdentityService, RegistrationError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use policy::{AuthenticationPolicy, PolicyError};
pub use repository::{SingleGatekeeperRepository, SingleUserRepository};
pub use services::{BiometricAuthenticationService, BiometryType, EncryptionService};
pub use session::{Session, SessionError, SessionRecord};
pub use types::{GatekeeperId, SessionId, Timestamp, UserId};
pub use user::{EncryptedPassword, User};

/// Session length installed on first launch (seconds)
pub const DEFAULT_SESSION_DURATION_SECS: i64 = 60;

/// Failed attempts allowed before authentication is blocked
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 3;

/// Block period after reaching the failure threshold (seconds)
pub const DEFAULT_BLOCK_DURATION_SECS: i64 = 15;
