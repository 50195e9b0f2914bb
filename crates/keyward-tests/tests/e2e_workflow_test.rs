//! End-to-end workflow tests for Keyward
//!
//! These tests drive the application service over the real file-backed
//! adapters, from first launch through lockout, unlock, session renewal and
//! reset.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::tempdir;

use keyward_access::{
    AccessConfig, AppError, AuthenticationMethod, AuthenticationRequest, AuthenticationResult,
    AuthenticationService, AuthenticationStatus, KdfConfig, ManualClock, PolicyConfig,
};
use keyward_core::{AccessError, AuthenticationPolicy, RegistrationError};

fn small_kdf() -> KdfConfig {
    KdfConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

/// Simulates the complete lifecycle of a single installation
#[test]
fn test_full_access_lifecycle() {
    let temp_dir = tempdir().unwrap();
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));

    // ==========================================
    // STEP 1: First launch
    // ==========================================
    let mut config = AccessConfig::load_or_create(temp_dir.path()).unwrap();
    config.kdf = small_kdf();
    config.policy = PolicyConfig {
        session_duration_secs: 2.0,
        max_failed_attempts: 2,
        block_duration_secs: 1.0,
    };

    let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
    assert!(!service.is_configured().unwrap());
    service
        .create_authentication_policy(&config.policy.to_policy().unwrap())
        .unwrap();
    assert!(!service.is_user_registered().unwrap());
    assert!(service
        .is_authentication_method_possible(AuthenticationMethod::Password)
        .unwrap());

    // ==========================================
    // STEP 2: Registration
    // ==========================================
    let err = service.register_user("abc123").unwrap_err();
    assert!(matches!(
        err,
        AppError::Core(AccessError::Registration(RegistrationError::PasswordMissingCapitalLetter))
    ));
    let user_id = service.register_user("Abc123").unwrap();
    assert!(service.is_user_registered().unwrap());
    assert!(!service.is_user_authenticated().unwrap());

    // ==========================================
    // STEP 3: Two wrong passwords block access
    // ==========================================
    let first = service
        .authenticate_user(&AuthenticationRequest::password("wrong"))
        .unwrap();
    assert_eq!(first.status(), AuthenticationStatus::Failure);

    clock.advance(Duration::milliseconds(500));
    let second = service
        .authenticate_user(&AuthenticationRequest::password("wrong"))
        .unwrap();
    assert_eq!(second.status(), AuthenticationStatus::Blocked);
    assert!(service.is_authentication_blocked().unwrap());
    assert_eq!(service.lockout_remaining().unwrap(), Some(Duration::seconds(1)));

    // ==========================================
    // STEP 4: Unlock once the block lifts
    // ==========================================
    clock.set(start + Duration::milliseconds(1500));
    assert!(!service.is_authentication_blocked().unwrap());
    let session_id = match service
        .authenticate_user(&AuthenticationRequest::password("Abc123"))
        .unwrap()
    {
        AuthenticationResult::Success { user_id: id, session_id } => {
            assert_eq!(id, user_id);
            session_id
        }
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(service.remaining_attempts().unwrap(), 2);

    // Session covers [1.5s, 3.5s]
    clock.set(start + Duration::milliseconds(3500));
    assert!(service.is_user_authenticated().unwrap());
    clock.set(start + Duration::milliseconds(3501));
    assert!(!service.is_user_authenticated().unwrap());
    assert!(!service.has_access(&session_id.to_string()).unwrap());

    // ==========================================
    // STEP 5: Renewal keeps the session alive
    // ==========================================
    let session_id = match service
        .authenticate_user(&AuthenticationRequest::password("Abc123"))
        .unwrap()
    {
        AuthenticationResult::Success { session_id, .. } => session_id,
        other => panic!("expected success, got {:?}", other),
    };
    for _ in 0..5 {
        clock.advance(Duration::milliseconds(1500));
        service.use_access().unwrap();
    }
    assert!(service.has_access(&session_id.to_string()).unwrap());

    // ==========================================
    // STEP 6: Lock, then reset
    // ==========================================
    assert!(service.end_session().unwrap());
    assert!(!service.is_user_authenticated().unwrap());

    service.reset().unwrap();
    assert!(!service.is_user_registered().unwrap());
    assert_eq!(service.max_password_attempts().unwrap(), 2);

    let new_user = service.register_user("Fresh456").unwrap();
    assert_ne!(new_user, user_id);
    let result = service
        .authenticate_user(&AuthenticationRequest::password("Abc123"))
        .unwrap();
    assert_eq!(result, AuthenticationResult::Failure);
}

#[test]
fn test_policy_change_applies_after_restart() {
    let temp_dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()));
    let mut config = AccessConfig::load_or_create(temp_dir.path()).unwrap();
    config.kdf = small_kdf();

    {
        let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
        service
            .create_authentication_policy(&AuthenticationPolicy::default())
            .unwrap();
        service.register_user("Abc123").unwrap();
        service
            .authenticate_user(&AuthenticationRequest::password("wrong"))
            .unwrap();
        service.configure_max_password_attempts(1).unwrap();
        service.configure_block_duration(Duration::seconds(300)).unwrap();
    }

    let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
    assert_eq!(service.max_password_attempts().unwrap(), 1);
    assert_eq!(service.block_duration().unwrap(), Duration::seconds(300));
    // The policy change discarded the earlier failure
    assert_eq!(service.remaining_attempts().unwrap(), 1);

    let result = service
        .authenticate_user(&AuthenticationRequest::password("wrong"))
        .unwrap();
    assert_eq!(result, AuthenticationResult::Blocked);

    clock.advance(Duration::seconds(299));
    assert!(service.is_authentication_blocked().unwrap());
    clock.advance(Duration::seconds(1));
    assert!(!service.is_authentication_blocked().unwrap());
}

#[test]
fn test_unconfigured_installation() {
    let temp_dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()));
    let mut config = AccessConfig::load_or_create(temp_dir.path()).unwrap();
    config.kdf = small_kdf();

    let service = AuthenticationService::from_config(&config, clock).unwrap();
    service.register_user("Abc123").unwrap();

    let err = service
        .authenticate_user(&AuthenticationRequest::password("Abc123"))
        .unwrap_err();
    assert!(err.is_not_configured());
    assert!(!service.is_user_authenticated().unwrap());

    // Biometric requests are rejected the same way
    let err = service
        .authenticate_user(&AuthenticationRequest::biometry())
        .unwrap_err();
    assert!(err.is_not_configured());
}
