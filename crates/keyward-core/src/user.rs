//! Registered user record
//!
//! The user references the gatekeeper's session by id only. The reference is
//! weak: the gatekeeper may have discarded that session since.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{SessionId, UserId};

/// Opaque output of the encryption capability for a password
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedPassword(String);

impl EncryptedPassword {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncryptedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptedPassword(..)")
    }
}

/// The primary user the application authenticates against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    password: EncryptedPassword,
    #[serde(default)]
    session_id: Option<SessionId>,
}

impl User {
    pub fn new(id: UserId, password: EncryptedPassword) -> Self {
        Self {
            id,
            password,
            session_id: None,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn password(&self) -> &EncryptedPassword {
        &self.password
    }

    /// Session this user last authenticated with
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn attach_session(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
    }

    pub fn detach_session(&mut self) {
        self.session_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_session() {
        let mut user = User::new(UserId::generate(), EncryptedPassword::new("x"));
        assert!(user.session_id().is_none());

        let session = SessionId::generate();
        user.attach_session(session);
        assert_eq!(user.session_id(), Some(session));

        user.detach_session();
        assert!(user.session_id().is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let user = User::new(UserId::generate(), EncryptedPassword::new("secret-hash"));
        let debug = format!("{:?}", user);
        assert!(!debug.contains("secret-hash"));
    }
}
