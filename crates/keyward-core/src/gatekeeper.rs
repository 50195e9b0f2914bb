//! Gatekeeper aggregate
//!
//! Controls access with a blocking behavior. Every successful credential
//! check is reported with [`Gatekeeper::allow_access`], every failed one with
//! [`Gatekeeper::deny_access`]. Once the failed-attempt count reaches the
//! policy maximum, access stays impossible until the block period after the
//! last denial has elapsed. Use of an existing access is reported with
//! [`Gatekeeper::use_access`], which renews the current session.
//!
//! Replacing the policy discards all accumulated state, so a changed block
//! duration is never applied to stale failure counts.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::policy::{AuthenticationPolicy, PolicyError};
use crate::session::{Session, SessionError};
use crate::types::{GatekeeperId, SessionId, Timestamp};

/// Errors returned by gatekeeper operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatekeeperError {
    /// Failed attempts reached the maximum and the block period has not elapsed
    #[error("access blocked")]
    AccessBlocked,

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Aggregate root for authentication state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gatekeeper {
    id: GatekeeperId,
    policy: AuthenticationPolicy,
    session: Option<Session>,
    failed_attempt_count: u32,
    access_denied_at: Option<Timestamp>,
}

impl Gatekeeper {
    /// Create a gatekeeper with no session and no recorded failures
    pub fn new(id: GatekeeperId, policy: AuthenticationPolicy) -> Self {
        Self {
            id,
            policy,
            session: None,
            failed_attempt_count: 0,
            access_denied_at: None,
        }
    }

    pub fn id(&self) -> GatekeeperId {
        self.id
    }

    pub fn policy(&self) -> &AuthenticationPolicy {
        &self.policy
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn failed_attempt_count(&self) -> u32 {
        self.failed_attempt_count
    }

    pub fn access_denied_at(&self) -> Option<Timestamp> {
        self.access_denied_at
    }

    /// Replace the policy and reset session and failure state
    pub fn set_policy(&mut self, policy: AuthenticationPolicy) {
        self.policy = policy;
        self.reset();
    }

    pub fn change_session_duration(
        &mut self,
        duration: Duration,
    ) -> std::result::Result<(), PolicyError> {
        let policy = self.policy.with_session_duration(duration)?;
        self.set_policy(policy);
        Ok(())
    }

    pub fn change_max_failed_attempts(
        &mut self,
        max_failed_attempts: u32,
    ) -> std::result::Result<(), PolicyError> {
        let policy = self.policy.with_max_failed_attempts(max_failed_attempts)?;
        self.set_policy(policy);
        Ok(())
    }

    pub fn change_block_duration(
        &mut self,
        duration: Duration,
    ) -> std::result::Result<(), PolicyError> {
        let policy = self.policy.with_block_duration(duration)?;
        self.set_policy(policy);
        Ok(())
    }

    /// Check whether authentication may be attempted at `time`
    ///
    /// Possible when nothing was denied yet, when attempts remain, or once
    /// the block period after the last denial has elapsed (inclusive).
    pub fn is_access_possible(&self, time: Timestamp) -> bool {
        let Some(denied_at) = self.access_denied_at else {
            return true;
        };
        let has_more_attempts = self.failed_attempt_count < self.policy.max_failed_attempts();
        let is_block_period_expired = match self.policy.block_lifts_at(denied_at) {
            Some(lifts_at) => time >= lifts_at,
            None => false,
        };
        has_more_attempts || is_block_period_expired
    }

    /// Lockout end if access is blocked at `time`
    pub fn blocked_until(&self, time: Timestamp) -> Option<Timestamp> {
        if self.is_access_possible(time) {
            return None;
        }
        self.access_denied_at
            .and_then(|denied_at| self.policy.block_lifts_at(denied_at))
    }

    /// Attempts left before the block engages
    pub fn remaining_attempts(&self) -> u32 {
        self.policy
            .max_failed_attempts()
            .saturating_sub(self.failed_attempt_count)
    }

    /// Grant access after a successful credential check
    ///
    /// Starts a fresh session, clears failure state and returns the new
    /// session id. The block is re-checked here even though callers check
    /// [`is_access_possible`](Self::is_access_possible) first.
    pub fn allow_access(
        &mut self,
        time: Timestamp,
    ) -> std::result::Result<SessionId, GatekeeperError> {
        self.ensure_not_blocked(time)?;
        let mut session = Session::new(SessionId::generate(), self.policy.session_duration())?;
        session.start(time)?;
        let session_id = session.id();
        self.session = Some(session);
        self.failed_attempt_count = 0;
        self.access_denied_at = None;
        Ok(session_id)
    }

    /// Record a failed credential check at `time`
    ///
    /// Drops the current session. The counter keeps growing past the maximum;
    /// only the comparison against the maximum matters.
    pub fn deny_access(&mut self, time: Timestamp) {
        self.session = None;
        self.failed_attempt_count = self.failed_attempt_count.saturating_add(1);
        self.access_denied_at = Some(time);
    }

    /// Check whether `session_id` is the current session and active at `time`
    pub fn has_access(&self, session_id: SessionId, time: Timestamp) -> bool {
        match &self.session {
            Some(session) => session.id() == session_id && session.is_active_at(time),
            None => false,
        }
    }

    /// Report use of the system at `time`, renewing the current session
    ///
    /// Fails with [`SessionError::NotActive`] when the session lapsed on its
    /// own; the caller must then re-authenticate.
    pub fn use_access(&mut self, time: Timestamp) -> std::result::Result<(), GatekeeperError> {
        self.ensure_not_blocked(time)?;
        if let Some(session) = self.session.as_mut() {
            session.renew(time)?;
        }
        Ok(())
    }

    /// Explicitly finish the current session at `time`
    ///
    /// The session stays attached but is never active again.
    pub fn end_session(&mut self, time: Timestamp) -> std::result::Result<(), GatekeeperError> {
        if let Some(session) = self.session.as_mut() {
            session.finish(time)?;
        }
        Ok(())
    }

    /// Clear session and failure state without touching the policy
    pub fn reset(&mut self) {
        self.session = None;
        self.failed_attempt_count = 0;
        self.access_denied_at = None;
    }

    /// Serialize for persistence
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from persistence
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn ensure_not_blocked(&self, time: Timestamp) -> std::result::Result<(), GatekeeperError> {
        if self.is_access_possible(time) {
            Ok(())
        } else {
            Err(GatekeeperError::AccessBlocked)
        }
    }
}
