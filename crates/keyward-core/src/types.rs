//! Identifier newtypes, time aliases and shared serde helpers

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccessError;

/// Point in time supplied by the caller of every time-dependent operation
pub type Timestamp = DateTime<Utc>;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from the canonical string form
            pub fn parse(s: &str) -> Result<Self, AccessError> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| AccessError::InvalidId(s.to_string()))
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Short display format (first 8 hex digits)
            pub fn short(&self) -> String {
                let mut hex = self.0.simple().to_string();
                hex.truncate(8);
                hex
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = AccessError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

entity_id! {
    /// Gatekeeper ID - identity of the single authentication-state aggregate
    GatekeeperId
}

entity_id! {
    /// Session ID - identity of one successful authentication
    SessionId
}

entity_id! {
    /// User ID - identity of the registered user record
    UserId
}

/// Longest duration a record can carry: 10,000 years in milliseconds
///
/// Below 2^50 milliseconds the float-seconds form converts back to the same
/// millisecond count, so every storable duration round-trips exactly.
pub const MAX_DURATION_MILLIS: i64 = 315_360_000_000_000;

/// Longest duration a policy or session may hold
pub fn max_duration() -> Duration {
    Duration::milliseconds(MAX_DURATION_MILLIS)
}

/// Whether `duration` fits the range a record can carry
pub fn is_recordable(duration: Duration) -> bool {
    duration.num_milliseconds().abs() <= MAX_DURATION_MILLIS
}

/// Drop everything below whole milliseconds, rounding toward zero
pub fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::milliseconds(duration.num_milliseconds())
}

/// Convert fractional seconds into a [`Duration`] of whole milliseconds
///
/// Returns `None` for non-finite input or values beyond [`MAX_DURATION_MILLIS`].
pub fn duration_from_secs_f64(secs: f64) -> Option<Duration> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1e3).round();
    if millis.abs() > MAX_DURATION_MILLIS as f64 {
        return None;
    }
    Some(Duration::milliseconds(millis as i64))
}

/// Convert a [`Duration`] into fractional seconds at millisecond precision
pub fn duration_as_secs_f64(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1e3
}

/// Serde helper storing a [`Duration`] as float seconds
pub mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(super::duration_as_secs_f64(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        super::duration_from_secs_f64(secs)
            .ok_or_else(|| serde::de::Error::custom("duration out of range"))
    }
}
