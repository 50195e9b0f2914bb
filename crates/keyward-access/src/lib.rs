//! Keyward Access - Application layer over the Keyward access-control engine
//!
//! Wires the domain model from `keyward-core` to concrete adapters:
//!
//! - [`AuthenticationService`] - clock-driven façade used by the UI or CLI
//! - [`FileGatekeeperRepository`] / [`FileUserRepository`] - JSON files in the data directory
//! - [`Argon2EncryptionService`] - Argon2id password transformation with a per-installation salt
//! - [`UnavailableBiometrics`] - headless biometric adapter
//! - [`AccessConfig`] - persisted configuration

pub mod biometry;
pub mod clock;
pub mod config;
pub mod encryption;
pub mod error;
pub mod service;
pub mod storage;

pub use biometry::UnavailableBiometrics;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AccessConfig, KdfConfig, PolicyConfig};
pub use encryption::{Argon2EncryptionService, InstallationSalt};
pub use error::{AppError, Result};
pub use service::{
    AuthenticationMethod, AuthenticationRequest, AuthenticationResult, AuthenticationService,
    AuthenticationStatus,
};
pub use storage::{FileGatekeeperRepository, FileUserRepository};
