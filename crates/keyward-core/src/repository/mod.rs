//! Repository contracts for the persisted entities
//!
//! Both repositories hold at most one record: the application has a single
//! gatekeeper and a single primary user. How records reach disk is up to the
//! implementation; [`memory`] provides in-process implementations.

pub mod memory;

pub use memory::{InMemoryGatekeeperRepository, InMemoryUserRepository};

use crate::error::Result;
use crate::gatekeeper::Gatekeeper;
use crate::types::{GatekeeperId, UserId};
use crate::user::{EncryptedPassword, User};

/// Storage for the single gatekeeper
pub trait SingleGatekeeperRepository: Send + Sync {
    /// The persisted gatekeeper, if one was ever saved
    fn gatekeeper(&self) -> Result<Option<Gatekeeper>>;

    /// Insert or replace the gatekeeper
    fn save(&self, gatekeeper: &Gatekeeper) -> Result<()>;

    /// Remove the gatekeeper if it is the stored one
    fn remove(&self, gatekeeper: &Gatekeeper) -> Result<()>;

    fn next_id(&self) -> GatekeeperId {
        GatekeeperId::generate()
    }
}

/// Storage for the single primary user
pub trait SingleUserRepository: Send + Sync {
    /// The registered user, if any
    fn primary_user(&self) -> Result<Option<User>>;

    /// The user whose stored password equals `password`
    fn user(&self, password: &EncryptedPassword) -> Result<Option<User>> {
        Ok(self
            .primary_user()?
            .filter(|user| user.password() == password))
    }

    /// Insert or replace the user
    fn save(&self, user: &User) -> Result<()>;

    /// Remove the user if it is the stored one
    fn remove(&self, user: &User) -> Result<()>;

    fn next_id(&self) -> UserId {
        UserId::generate()
    }
}
