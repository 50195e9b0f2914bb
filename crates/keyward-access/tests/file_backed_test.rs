//! Authentication service over the file-backed adapters

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use keyward_access::{
    AccessConfig, AppError, AuthenticationRequest, AuthenticationResult, AuthenticationService,
    AuthenticationStatus, KdfConfig, ManualClock,
};
use keyward_core::{AccessError, AuthenticationPolicy, RegistrationError};
use tempfile::{tempdir, TempDir};

const PASSWORD: &str = "Abc123";

fn test_config(temp_dir: &TempDir) -> AccessConfig {
    let mut config = AccessConfig::load_or_create(&temp_dir.path().join("keyward")).unwrap();
    config.kdf = KdfConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    };
    config
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
}

#[test]
fn test_state_survives_restart() {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let clock = clock();

    let session_id = {
        let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
        service
            .create_authentication_policy(&AuthenticationPolicy::default())
            .unwrap();
        service.register_user(PASSWORD).unwrap();
        match service
            .authenticate_user(&AuthenticationRequest::password(PASSWORD))
            .unwrap()
        {
            AuthenticationResult::Success { session_id, .. } => session_id,
            other => panic!("expected success, got {:?}", other),
        }
    };

    // A new service over the same directory sees the session
    let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
    assert!(service.is_user_registered().unwrap());
    assert!(service.is_user_authenticated().unwrap());
    assert!(service.has_access(&session_id.to_string()).unwrap());

    // Same salt after restart: the password still matches
    service.end_session().unwrap();
    let result = service
        .authenticate_user(&AuthenticationRequest::password(PASSWORD))
        .unwrap();
    assert_eq!(result.status(), AuthenticationStatus::Success);
}

#[test]
fn test_lockout_survives_restart() {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let clock = clock();
    let policy =
        AuthenticationPolicy::new(Duration::seconds(60), 2, Duration::seconds(30)).unwrap();

    {
        let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
        service.create_authentication_policy(&policy).unwrap();
        service.register_user(PASSWORD).unwrap();
        service
            .authenticate_user(&AuthenticationRequest::password("Wrong1"))
            .unwrap();
        let result = service
            .authenticate_user(&AuthenticationRequest::password("Wrong1"))
            .unwrap();
        assert_eq!(result, AuthenticationResult::Blocked);
    }

    let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
    assert!(service.is_authentication_blocked().unwrap());
    clock.advance(Duration::seconds(30));
    assert!(!service.is_authentication_blocked().unwrap());
}

#[test]
fn test_second_registration_rejected() {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let service = AuthenticationService::from_config(&config, clock()).unwrap();
    service
        .create_authentication_policy(&AuthenticationPolicy::default())
        .unwrap();
    service.register_user(PASSWORD).unwrap();

    let err = service.register_user("Other123").unwrap_err();
    assert!(matches!(
        err,
        AppError::Core(AccessError::Registration(RegistrationError::UserAlreadyRegistered))
    ));
}

#[test]
fn test_reset_removes_user_file() {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let service = AuthenticationService::from_config(&config, clock()).unwrap();
    service
        .create_authentication_policy(&AuthenticationPolicy::default())
        .unwrap();
    service.register_user(PASSWORD).unwrap();
    assert!(config.data_dir.join("user.json").exists());

    service.reset().unwrap();
    assert!(!config.data_dir.join("user.json").exists());
    assert!(config.data_dir.join("gatekeeper.json").exists());
    assert!(service.is_configured().unwrap());
}

#[test]
fn test_password_matches_after_kdf_config_change() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    let clock = clock();

    {
        let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
        service
            .create_authentication_policy(&AuthenticationPolicy::default())
            .unwrap();
        service.register_user(PASSWORD).unwrap();
    }

    // Editing config.json does not re-derive the stored password
    config.kdf.memory_kib = 128;
    config.save(&config.config_path()).unwrap();
    let config = AccessConfig::load(&config.config_path()).unwrap();
    assert_eq!(config.kdf.memory_kib, 128);

    let service = AuthenticationService::from_config(&config, clock).unwrap();
    let result = service
        .authenticate_user(&AuthenticationRequest::password(PASSWORD))
        .unwrap();
    assert_eq!(result.status(), AuthenticationStatus::Success);
}

#[test]
fn test_long_policy_survives_restart() {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let clock = clock();
    let policy =
        AuthenticationPolicy::new(Duration::days(120_000), 3, Duration::seconds(15)).unwrap();

    {
        let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
        service.create_authentication_policy(&policy).unwrap();
        service.register_user(PASSWORD).unwrap();
        let result = service
            .authenticate_user(&AuthenticationRequest::password(PASSWORD))
            .unwrap();
        assert_eq!(result.status(), AuthenticationStatus::Success);
    }

    let service = AuthenticationService::from_config(&config, clock.clone()).unwrap();
    assert_eq!(service.policy().unwrap(), policy);
    clock.advance(Duration::days(119_999));
    assert!(service.is_user_authenticated().unwrap());
}
