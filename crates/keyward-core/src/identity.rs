//! Identity service
//!
//! Handles registration and authentication of the primary user. Credential
//! checks (password comparison or biometric prompt) are only run while the
//! gatekeeper allows access; their outcome is fed back into the gatekeeper.
//!
//! # Failure mode
//!
//! A successful authentication persists the gatekeeper and then the user as
//! two independent writes. A crash between them leaves the gatekeeper with a
//! fresh session while the user still points at the previous (or no) session
//! id; the user then simply appears unauthenticated and must log in again.
//!
//! Callers serving concurrent requests must serialize the whole
//! load-decide-persist sequence around the gatekeeper.

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{AccessError, Result};
use crate::gatekeeper::Gatekeeper;
use crate::policy::AuthenticationPolicy;
use crate::repository::{SingleGatekeeperRepository, SingleUserRepository};
use crate::services::{BiometricAuthenticationService, EncryptionService};
use crate::types::{Timestamp, UserId};
use crate::user::User;

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Maximum password length in characters
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// Registration input errors, reported in validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RegistrationError {
    #[error("a user is already registered")]
    UserAlreadyRegistered,

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,

    #[error("password must contain a capital letter")]
    PasswordMissingCapitalLetter,

    #[error("password must contain a digit")]
    PasswordMissingDigit,
}

/// Validate a plaintext password against the registration rules
///
/// Length is counted in characters. Any Unicode uppercase letter satisfies
/// the capital-letter rule, but only ASCII `0`-`9` satisfy the digit rule:
/// decimal digits from other scripts such as `٣` or full-width `３` do not count.
pub fn validate_password(password: &str) -> std::result::Result<(), RegistrationError> {
    if password.is_empty() {
        return Err(RegistrationError::EmptyPassword);
    }
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(RegistrationError::PasswordTooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(RegistrationError::PasswordTooLong);
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(RegistrationError::PasswordMissingCapitalLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(RegistrationError::PasswordMissingDigit);
    }
    Ok(())
}

/// Collaborators injected into the identity service
#[derive(Clone)]
pub struct IdentityContext {
    pub gatekeepers: Arc<dyn SingleGatekeeperRepository>,
    pub users: Arc<dyn SingleUserRepository>,
    pub encryption: Arc<dyn EncryptionService>,
    pub biometrics: Arc<dyn BiometricAuthenticationService>,
}

/// Domain service for registration and authentication
pub struct IdentityService {
    context: IdentityContext,
}

impl IdentityService {
    pub fn new(context: IdentityContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &IdentityContext {
        &self.context
    }

    /// Check whether the primary user holds an active session at `time`
    pub fn is_user_authenticated(&self, time: Timestamp) -> Result<bool> {
        let Some(gatekeeper) = self.context.gatekeepers.gatekeeper()? else {
            return Ok(false);
        };
        let Some(session_id) = self
            .context
            .users
            .primary_user()?
            .and_then(|user| user.session_id())
        else {
            return Ok(false);
        };
        Ok(gatekeeper.has_access(session_id, time))
    }

    /// Create and persist a gatekeeper with a new policy
    ///
    /// The repository holds a single gatekeeper; creating another one
    /// replaces the stored record.
    pub fn create_gatekeeper(
        &self,
        session_duration: Duration,
        max_failed_attempts: u32,
        block_duration: Duration,
    ) -> Result<Gatekeeper> {
        let policy =
            AuthenticationPolicy::new(session_duration, max_failed_attempts, block_duration)?;
        if let Some(existing) = self.context.gatekeepers.gatekeeper()? {
            warn!("Replacing existing gatekeeper {}", existing.id().short());
        }
        let gatekeeper = Gatekeeper::new(self.context.gatekeepers.next_id(), policy);
        self.context.gatekeepers.save(&gatekeeper)?;
        info!("Created gatekeeper {}", gatekeeper.id().short());
        Ok(gatekeeper)
    }

    /// Register the primary user and activate biometry
    pub fn register_user(&self, password: &str) -> Result<UserId> {
        if self.context.users.primary_user()?.is_some() {
            return Err(RegistrationError::UserAlreadyRegistered.into());
        }
        validate_password(password)?;
        let encrypted = self.context.encryption.encrypted(password)?;
        let user = User::new(self.context.users.next_id(), encrypted);
        self.context.users.save(&user)?;
        self.context.biometrics.activate()?;
        info!("Registered user {}", user.id().short());
        Ok(user.id())
    }

    /// Authenticate with a password
    ///
    /// Returns `None` when the password does not match or access is blocked.
    pub fn authenticate_user(&self, password: &str, time: Timestamp) -> Result<Option<UserId>> {
        self.authenticate(time, || {
            let encrypted = self.context.encryption.encrypted(password)?;
            self.context.users.user(&encrypted)
        })
    }

    /// Authenticate with the platform biometric prompt
    pub fn authenticate_user_biometrically(&self, time: Timestamp) -> Result<Option<UserId>> {
        self.authenticate(time, || {
            if !self.context.biometrics.authenticate()? {
                return Ok(None);
            }
            self.context.users.primary_user()
        })
    }

    fn authenticate<F>(&self, time: Timestamp, check_credentials: F) -> Result<Option<UserId>>
    where
        F: FnOnce() -> Result<Option<User>>,
    {
        let mut gatekeeper = self
            .context
            .gatekeepers
            .gatekeeper()?
            .ok_or(AccessError::GatekeeperNotFound)?;

        // No attempt is recorded while blocked
        if !gatekeeper.is_access_possible(time) {
            debug!("Authentication attempt while blocked");
            return Ok(None);
        }

        let Some(mut user) = check_credentials()? else {
            gatekeeper.deny_access(time);
            self.context.gatekeepers.save(&gatekeeper)?;
            warn!(
                "Authentication failed ({} attempts remaining)",
                gatekeeper.remaining_attempts()
            );
            return Ok(None);
        };

        let session_id = gatekeeper.allow_access(time)?;
        self.context.gatekeepers.save(&gatekeeper)?;
        user.attach_session(session_id);
        self.context.users.save(&user)?;
        info!(
            "User {} authenticated, session {}",
            user.id().short(),
            session_id.short()
        );
        Ok(Some(user.id()))
    }
}
