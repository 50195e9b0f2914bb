//! Authentication application service
//!
//! Façade the UI (or the CLI) talks to. It reads the clock, forwards to the
//! [`IdentityService`] and translates outcomes into [`AuthenticationResult`]s.
//! Policy changes and resets are applied to the stored gatekeeper and
//! persisted immediately.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use keyward_core::{
    AccessError, AuthenticationPolicy, BiometryType, Gatekeeper, IdentityContext, IdentityService,
    PolicyError, SessionId, Timestamp, UserId,
};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::biometry::UnavailableBiometrics;
use crate::clock::Clock;
use crate::config::AccessConfig;
use crate::encryption::Argon2EncryptionService;
use crate::error::{AppError, Result};
use crate::storage::{FileGatekeeperRepository, FileUserRepository};

/// Ways the user can prove their identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationMethod {
    Password,
    TouchId,
    FaceId,
}

impl AuthenticationMethod {
    pub fn is_biometry(self) -> bool {
        matches!(self, AuthenticationMethod::TouchId | AuthenticationMethod::FaceId)
    }
}

/// A single authentication attempt
pub enum AuthenticationRequest {
    /// Plaintext password, zeroized on drop
    Password(Zeroizing<String>),
    /// Platform biometric prompt
    Biometry,
}

impl AuthenticationRequest {
    pub fn password(password: impl Into<String>) -> Self {
        AuthenticationRequest::Password(Zeroizing::new(password.into()))
    }

    pub fn biometry() -> Self {
        AuthenticationRequest::Biometry
    }
}

impl fmt::Debug for AuthenticationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticationRequest::Password(_) => f.write_str("Password(..)"),
            AuthenticationRequest::Biometry => f.write_str("Biometry"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationStatus {
    Success,
    Failure,
    Blocked,
}

/// Outcome of an authentication attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationResult {
    Success { user_id: UserId, session_id: SessionId },
    /// Credentials rejected, further attempts possible
    Failure,
    /// Credentials rejected or not checked; authentication is blocked
    Blocked,
}

impl AuthenticationResult {
    pub fn status(&self) -> AuthenticationStatus {
        match self {
            AuthenticationResult::Success { .. } => AuthenticationStatus::Success,
            AuthenticationResult::Failure => AuthenticationStatus::Failure,
            AuthenticationResult::Blocked => AuthenticationStatus::Blocked,
        }
    }
}

/// Clock-driven authentication façade
pub struct AuthenticationService {
    identity: IdentityService,
    clock: Arc<dyn Clock>,
}

impl AuthenticationService {
    pub fn new(context: IdentityContext, clock: Arc<dyn Clock>) -> Self {
        Self {
            identity: IdentityService::new(context),
            clock,
        }
    }

    /// Wire the file-backed adapters for the configured data directory
    pub fn from_config(config: &AccessConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.ensure_directories()?;
        let context = IdentityContext {
            gatekeepers: Arc::new(FileGatekeeperRepository::in_dir(&config.data_dir)),
            users: Arc::new(FileUserRepository::in_dir(&config.data_dir)),
            encryption: Arc::new(Argon2EncryptionService::in_dir(&config.data_dir, &config.kdf)?),
            biometrics: Arc::new(UnavailableBiometrics),
        };
        Ok(Self::new(context, clock))
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn context(&self) -> &IdentityContext {
        self.identity.context()
    }

    fn gatekeeper(&self) -> Result<Gatekeeper> {
        let gatekeeper = self
            .context()
            .gatekeepers
            .gatekeeper()?
            .ok_or(AccessError::GatekeeperNotFound)?;
        Ok(gatekeeper)
    }

    fn save_gatekeeper(&self, gatekeeper: &Gatekeeper) -> Result<()> {
        self.context().gatekeepers.save(gatekeeper)?;
        Ok(())
    }

    // ---- Queries ----

    /// Whether an authentication policy was ever created
    pub fn is_configured(&self) -> Result<bool> {
        Ok(self.context().gatekeepers.gatekeeper()?.is_some())
    }

    pub fn policy(&self) -> Result<AuthenticationPolicy> {
        Ok(*self.gatekeeper()?.policy())
    }

    pub fn session_duration(&self) -> Result<Duration> {
        Ok(self.policy()?.session_duration())
    }

    pub fn max_password_attempts(&self) -> Result<u32> {
        Ok(self.policy()?.max_failed_attempts())
    }

    pub fn block_duration(&self) -> Result<Duration> {
        Ok(self.policy()?.block_duration())
    }

    pub fn is_user_registered(&self) -> Result<bool> {
        Ok(self.context().users.primary_user()?.is_some())
    }

    /// Whether the primary user holds an active session now
    pub fn is_user_authenticated(&self) -> Result<bool> {
        Ok(self.identity.is_user_authenticated(self.now())?)
    }

    /// Whether `session_id` is the current, active session
    ///
    /// A malformed id is simply not a valid session.
    pub fn has_access(&self, session_id: &str) -> Result<bool> {
        let Ok(session_id) = SessionId::parse(session_id) else {
            return Ok(false);
        };
        Ok(self.gatekeeper()?.has_access(session_id, self.now()))
    }

    pub fn is_authentication_blocked(&self) -> Result<bool> {
        Ok(!self.gatekeeper()?.is_access_possible(self.now()))
    }

    /// Time until the block lifts, if currently blocked
    pub fn lockout_remaining(&self) -> Result<Option<Duration>> {
        let now = self.now();
        Ok(self
            .gatekeeper()?
            .blocked_until(now)
            .map(|lifts_at| lifts_at - now))
    }

    pub fn remaining_attempts(&self) -> Result<u32> {
        Ok(self.gatekeeper()?.remaining_attempts())
    }

    /// Whether this host offers `method` at all
    pub fn is_authentication_method_supported(&self, method: AuthenticationMethod) -> bool {
        let biometry = self.context().biometrics.biometry_type();
        match method {
            AuthenticationMethod::Password => true,
            AuthenticationMethod::TouchId => biometry == BiometryType::TouchId,
            AuthenticationMethod::FaceId => biometry == BiometryType::FaceId,
        }
    }

    /// Whether `method` can be used right now
    ///
    /// Nothing is possible while authentication is blocked; biometry also
    /// needs the prompt to be available.
    pub fn is_authentication_method_possible(&self, method: AuthenticationMethod) -> Result<bool> {
        if !self.gatekeeper()?.is_access_possible(self.now()) {
            return Ok(false);
        }
        if !method.is_biometry() {
            return Ok(true);
        }
        Ok(self.is_authentication_method_supported(method)
            && self.context().biometrics.is_authentication_available())
    }

    // ---- Commands ----

    /// Create the gatekeeper with `policy`
    pub fn create_authentication_policy(
        &self,
        policy: &AuthenticationPolicy,
    ) -> Result<Gatekeeper> {
        let gatekeeper = self.identity.create_gatekeeper(
            policy.session_duration(),
            policy.max_failed_attempts(),
            policy.block_duration(),
        )?;
        Ok(gatekeeper)
    }

    pub fn register_user(&self, password: &str) -> Result<UserId> {
        Ok(self.identity.register_user(password)?)
    }

    /// Attempt authentication at the current time
    ///
    /// An empty password is rejected before it reaches the gatekeeper and
    /// is not counted as an attempt.
    pub fn authenticate_user(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<AuthenticationResult> {
        let now = self.now();
        let user_id = match request {
            AuthenticationRequest::Password(password) => {
                if password.is_empty() {
                    return Err(AppError::EmptyPassword);
                }
                self.identity.authenticate_user(password, now)?
            }
            AuthenticationRequest::Biometry => self.identity.authenticate_user_biometrically(now)?,
        };

        let gatekeeper = self.gatekeeper()?;
        if let Some(user_id) = user_id {
            let session_id = gatekeeper
                .session()
                .map(|session| session.id())
                .ok_or(AppError::MissingSession)?;
            return Ok(AuthenticationResult::Success {
                user_id,
                session_id,
            });
        }

        if gatekeeper.is_access_possible(now) {
            Ok(AuthenticationResult::Failure)
        } else {
            warn!("Authentication blocked until {:?}", gatekeeper.blocked_until(now));
            Ok(AuthenticationResult::Blocked)
        }
    }

    /// Report activity, sliding the session window to now
    pub fn use_access(&self) -> Result<()> {
        let mut gatekeeper = self.gatekeeper()?;
        if gatekeeper.session().is_none() {
            return Err(AppError::MissingSession);
        }
        gatekeeper
            .use_access(self.now())
            .map_err(AccessError::from)?;
        self.save_gatekeeper(&gatekeeper)
    }

    /// Finish the current session and detach it from the user
    ///
    /// Returns whether an active session was ended; locking an already
    /// expired or missing session only clears the user's reference.
    pub fn end_session(&self) -> Result<bool> {
        let now = self.now();
        let mut gatekeeper = self.gatekeeper()?;
        let is_active = gatekeeper
            .session()
            .is_some_and(|session| session.is_active_at(now));
        if is_active {
            gatekeeper.end_session(now).map_err(AccessError::from)?;
            self.save_gatekeeper(&gatekeeper)?;
        }

        let users = &self.context().users;
        if let Some(mut user) = users.primary_user()? {
            if user.session_id().is_some() {
                user.detach_session();
                users.save(&user)?;
            }
        }
        if is_active {
            info!("Session ended");
        }
        Ok(is_active)
    }

    pub fn configure_session(&self, duration: Duration) -> Result<()> {
        self.reconfigure(|gatekeeper| gatekeeper.change_session_duration(duration))
    }

    pub fn configure_max_password_attempts(&self, count: u32) -> Result<()> {
        self.reconfigure(|gatekeeper| gatekeeper.change_max_failed_attempts(count))
    }

    pub fn configure_block_duration(&self, duration: Duration) -> Result<()> {
        self.reconfigure(|gatekeeper| gatekeeper.change_block_duration(duration))
    }

    /// Replace the whole policy at once
    pub fn configure_policy(&self, policy: &AuthenticationPolicy) -> Result<()> {
        self.reconfigure(|gatekeeper| {
            gatekeeper.set_policy(*policy);
            Ok(())
        })
    }

    fn reconfigure<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Gatekeeper) -> std::result::Result<(), PolicyError>,
    {
        let mut gatekeeper = self.gatekeeper()?;
        change(&mut gatekeeper).map_err(AccessError::from)?;
        self.save_gatekeeper(&gatekeeper)?;
        info!("Authentication policy changed: {:?}", gatekeeper.policy());
        Ok(())
    }

    /// Remove the registered user and clear gatekeeper state
    ///
    /// The policy is kept.
    pub fn reset(&self) -> Result<()> {
        let users = &self.context().users;
        if let Some(user) = users.primary_user()? {
            users.remove(&user)?;
        }
        if let Some(mut gatekeeper) = self.context().gatekeepers.gatekeeper()? {
            gatekeeper.reset();
            self.save_gatekeeper(&gatekeeper)?;
        }
        info!("Authentication state reset");
        Ok(())
    }
}
