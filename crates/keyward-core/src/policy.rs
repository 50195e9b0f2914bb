//! Authentication policy
//!
//! Configures the gatekeeper's session length, the number of failed attempts
//! tolerated before authentication is blocked, and the length of the block.
//! A policy is immutable; the `with_*` derivations build a new, re-validated value.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{duration_secs, is_recordable, max_duration, truncate_to_millis, Timestamp};
use crate::{
    DEFAULT_BLOCK_DURATION_SECS, DEFAULT_MAX_FAILED_ATTEMPTS, DEFAULT_SESSION_DURATION_SECS,
};

/// Rejected policy values, reported in validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum PolicyError {
    #[error("session duration must be positive")]
    SessionDurationMustBePositive,

    #[error("max failed attempts must be positive")]
    MaxFailedAttemptsMustBePositive,

    #[error("block duration must not be negative")]
    BlockDurationMustBeNonNegative,

    #[error("duration exceeds the longest recordable duration")]
    DurationTooLong,
}

/// Validated gatekeeper configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "PolicyRecord", try_from = "PolicyRecord")]
pub struct AuthenticationPolicy {
    session_duration: Duration,
    max_failed_attempts: u32,
    block_duration: Duration,
}

/// Persisted policy layout
#[derive(Serialize, Deserialize)]
struct PolicyRecord {
    #[serde(with = "duration_secs")]
    session_duration: Duration,
    max_failed_attempts: u32,
    #[serde(with = "duration_secs")]
    block_duration: Duration,
}

impl AuthenticationPolicy {
    /// Create a policy, reporting the first violated constraint
    ///
    /// Durations are kept at whole milliseconds and may not exceed
    /// [`max_duration`]. A session shorter than one millisecond is rejected
    /// as non-positive.
    pub fn new(
        session_duration: Duration,
        max_failed_attempts: u32,
        block_duration: Duration,
    ) -> Result<Self, PolicyError> {
        let session_duration_ms = truncate_to_millis(session_duration);
        if session_duration_ms <= Duration::zero() {
            return Err(PolicyError::SessionDurationMustBePositive);
        }
        if max_failed_attempts == 0 {
            return Err(PolicyError::MaxFailedAttemptsMustBePositive);
        }
        if block_duration < Duration::zero() {
            return Err(PolicyError::BlockDurationMustBeNonNegative);
        }
        if !is_recordable(session_duration) || !is_recordable(block_duration) {
            return Err(PolicyError::DurationTooLong);
        }
        Ok(Self {
            session_duration: session_duration_ms,
            max_failed_attempts,
            block_duration: truncate_to_millis(block_duration),
        })
    }

    /// Stricter preset: short sessions, two attempts, one minute block
    pub fn strict() -> Self {
        Self {
            session_duration: Duration::seconds(30),
            max_failed_attempts: 2,
            block_duration: Duration::seconds(60),
        }
    }

    /// Lenient preset for development machines
    pub fn lenient() -> Self {
        Self {
            session_duration: Duration::minutes(30),
            max_failed_attempts: 5,
            block_duration: Duration::seconds(5),
        }
    }

    /// Time period during which no authentication is requested
    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    /// Failed attempts tolerated before authentication becomes blocked
    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    /// Period during which authentication is forbidden once blocked
    pub fn block_duration(&self) -> Duration {
        self.block_duration
    }

    /// Instant at which a block started at `denied_at` is lifted
    ///
    /// `None` when the sum overflows the representable range, i.e. never.
    pub fn block_lifts_at(&self, denied_at: Timestamp) -> Option<Timestamp> {
        denied_at.checked_add_signed(self.block_duration)
    }

    pub fn with_session_duration(&self, session_duration: Duration) -> Result<Self, PolicyError> {
        Self::new(session_duration, self.max_failed_attempts, self.block_duration)
    }

    pub fn with_max_failed_attempts(&self, max_failed_attempts: u32) -> Result<Self, PolicyError> {
        Self::new(self.session_duration, max_failed_attempts, self.block_duration)
    }

    pub fn with_block_duration(&self, block_duration: Duration) -> Result<Self, PolicyError> {
        Self::new(self.session_duration, self.max_failed_attempts, block_duration)
    }
}

impl Default for AuthenticationPolicy {
    fn default() -> Self {
        Self {
            session_duration: Duration::seconds(DEFAULT_SESSION_DURATION_SECS),
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            block_duration: Duration::seconds(DEFAULT_BLOCK_DURATION_SECS),
        }
    }
}

impl From<AuthenticationPolicy> for PolicyRecord {
    fn from(policy: AuthenticationPolicy) -> Self {
        Self {
            session_duration: policy.session_duration,
            max_failed_attempts: policy.max_failed_attempts,
            block_duration: policy.block_duration,
        }
    }
}

impl TryFrom<PolicyRecord> for AuthenticationPolicy {
    type Error = PolicyError;

    fn try_from(record: PolicyRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.session_duration,
            record.max_failed_attempts,
            record.block_duration,
        )
    }
}
