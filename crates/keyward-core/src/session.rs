//! Authenticated session
//!
//! A session represents the period during which a successful authentication
//! is still valid. It is created unstarted, started once, renewed any number
//! of times while active and optionally finished. Expiry is not a state
//! change: [`Session::is_active_at`] simply reports `false` once the window
//! has passed.
//!
//! Sessions are owned by the [`Gatekeeper`](crate::Gatekeeper); construction
//! and state transitions are only reachable through its API.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::types::{duration_secs, is_recordable, truncate_to_millis, SessionId, Timestamp};

/// Session state-precondition and validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SessionError {
    #[error("session duration must be positive, recordable and in whole milliseconds")]
    InvalidDuration,

    #[error("session was active already")]
    WasActiveAlready,

    #[error("session is not active")]
    NotActive,

    #[error("session was finished already")]
    WasFinishedAlready,
}

/// Time-windowed activity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SessionRecord", try_from = "SessionRecord")]
pub struct Session {
    id: SessionId,
    duration: Duration,
    started_at: Option<Timestamp>,
    ended_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
}

/// Flat persisted layout of a [`Session`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    /// Session length in float seconds
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl Session {
    /// Create an unstarted session
    pub(crate) fn new(
        id: SessionId,
        duration: Duration,
    ) -> std::result::Result<Self, SessionError> {
        if duration <= Duration::zero()
            || !is_recordable(duration)
            || truncate_to_millis(duration) != duration
        {
            return Err(SessionError::InvalidDuration);
        }
        Ok(Self {
            id,
            duration,
            started_at: None,
            ended_at: None,
            updated_at: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    /// End of the current activity window
    ///
    /// `None` if the session never started, was finished, or the window end
    /// is beyond the representable range.
    pub fn expires_at(&self) -> Option<Timestamp> {
        if self.ended_at.is_some() {
            return None;
        }
        let window_start = self.updated_at.or(self.started_at)?;
        window_start.checked_add_signed(self.duration)
    }

    /// Check whether the session is active at `time`
    ///
    /// Active means started, not finished, and `time` within the closed
    /// interval from the start to the last renewal (or start) plus duration.
    pub fn is_active_at(&self, time: Timestamp) -> bool {
        if self.ended_at.is_some() {
            return false;
        }
        let Some(started_at) = self.started_at else {
            return false;
        };
        if time < started_at {
            return false;
        }
        let window_start = self.updated_at.unwrap_or(started_at);
        match window_start.checked_add_signed(self.duration) {
            Some(ends_at) => time <= ends_at,
            // Window end past the representable range never arrives
            None => true,
        }
    }

    /// Start the session at `time`
    pub(crate) fn start(&mut self, time: Timestamp) -> std::result::Result<(), SessionError> {
        if self.ended_at.is_some() {
            return Err(SessionError::WasFinishedAlready);
        }
        if self.is_active_at(time) {
            return Err(SessionError::WasActiveAlready);
        }
        self.started_at = Some(time);
        Ok(())
    }

    /// Slide the activity window so that it ends at `time + duration`
    pub(crate) fn renew(&mut self, time: Timestamp) -> std::result::Result<(), SessionError> {
        if !self.is_active_at(time) {
            return Err(SessionError::NotActive);
        }
        self.updated_at = Some(time);
        Ok(())
    }

    /// Finish an active session; a finished session is never active again
    pub(crate) fn finish(&mut self, time: Timestamp) -> std::result::Result<(), SessionError> {
        if !self.is_active_at(time) {
            return Err(SessionError::NotActive);
        }
        self.ended_at = Some(time);
        Ok(())
    }

    /// Serialize to the persisted record encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&SessionRecord::from(self.clone()))?)
    }

    /// Deserialize from the persisted record encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: SessionRecord = serde_json::from_slice(bytes)?;
        Ok(Session::try_from(record)?)
    }
}

impl From<Session> for SessionRecord {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            duration: session.duration,
            started_at: session.started_at,
            ended_at: session.ended_at,
            updated_at: session.updated_at,
        }
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = SessionError;

    fn try_from(record: SessionRecord) -> std::result::Result<Self, Self::Error> {
        let mut session = Session::new(record.id, record.duration)?;
        session.started_at = record.started_at;
        session.ended_at = record.ended_at;
        session.updated_at = record.updated_at;
        Ok(session)
    }
}
