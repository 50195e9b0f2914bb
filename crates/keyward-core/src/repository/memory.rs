//! In-process single-slot repositories

use std::sync::{PoisonError, RwLock};

use super::{SingleGatekeeperRepository, SingleUserRepository};
use crate::error::Result;
use crate::gatekeeper::Gatekeeper;
use crate::user::User;

/// Gatekeeper repository backed by memory
#[derive(Debug, Default)]
pub struct InMemoryGatekeeperRepository {
    slot: RwLock<Option<Gatekeeper>>,
}

impl InMemoryGatekeeperRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SingleGatekeeperRepository for InMemoryGatekeeperRepository {
    fn gatekeeper(&self) -> Result<Option<Gatekeeper>> {
        Ok(self.slot.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, gatekeeper: &Gatekeeper) -> Result<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(gatekeeper.clone());
        Ok(())
    }

    fn remove(&self, gatekeeper: &Gatekeeper) -> Result<()> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(Gatekeeper::id) == Some(gatekeeper.id()) {
            *slot = None;
        }
        Ok(())
    }
}

/// User repository backed by memory
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    slot: RwLock<Option<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SingleUserRepository for InMemoryUserRepository {
    fn primary_user(&self) -> Result<Option<User>> {
        Ok(self.slot.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, user: &User) -> Result<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        Ok(())
    }

    fn remove(&self, user: &User) -> Result<()> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(User::id) == Some(user.id()) {
            *slot = None;
        }
        Ok(())
    }
}
