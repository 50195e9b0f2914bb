//! Property tests for the gatekeeper lockout rules over the public API

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use keyward_core::repository::{InMemoryGatekeeperRepository, InMemoryUserRepository};
use keyward_core::{
    AuthenticationPolicy, BiometricAuthenticationService, BiometryType, EncryptedPassword,
    EncryptionService, Gatekeeper, GatekeeperId, IdentityContext, IdentityService,
    SingleGatekeeperRepository, Timestamp,
};
use proptest::prelude::*;

fn at(millis: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(millis)
}

struct Identity;

impl EncryptionService for Identity {
    fn encrypted(&self, plaintext: &str) -> keyward_core::Result<EncryptedPassword> {
        Ok(EncryptedPassword::new(plaintext))
    }
}

struct NoBiometry;

impl BiometricAuthenticationService for NoBiometry {
    fn is_authentication_available(&self) -> bool {
        false
    }

    fn biometry_type(&self) -> BiometryType {
        BiometryType::None
    }

    fn activate(&self) -> keyward_core::Result<()> {
        Ok(())
    }

    fn authenticate(&self) -> keyward_core::Result<bool> {
        Ok(false)
    }
}

proptest! {
    /// Access is blocked exactly when the threshold is reached and the block
    /// period after the last denial has not yet elapsed.
    #[test]
    fn prop_block_iff_threshold_and_period(
        max in 1u32..6,
        denials in 0u32..10,
        block_ms in 0i64..10_000,
        check_at in 0i64..20_000,
    ) {
        let policy = AuthenticationPolicy::new(
            Duration::seconds(60),
            max,
            Duration::milliseconds(block_ms),
        ).unwrap();
        let mut gatekeeper = Gatekeeper::new(GatekeeperId::generate(), policy);
        for _ in 0..denials {
            gatekeeper.deny_access(at(0));
        }
        let blocked = denials >= max && check_at < block_ms;
        prop_assert_eq!(gatekeeper.is_access_possible(at(check_at)), !blocked);
        prop_assert_eq!(gatekeeper.blocked_until(at(check_at)).is_some(), blocked);
    }

    /// Outside a block, any sequence of wrong passwords followed by the
    /// right one yields an active session and clears the failure count.
    #[test]
    fn prop_success_after_block_clears_failures(wrong in 0usize..8) {
        let gatekeepers = Arc::new(InMemoryGatekeeperRepository::new());
        let service = IdentityService::new(IdentityContext {
            gatekeepers: gatekeepers.clone(),
            users: Arc::new(InMemoryUserRepository::new()),
            encryption: Arc::new(Identity),
            biometrics: Arc::new(NoBiometry),
        });
        service.create_gatekeeper(Duration::seconds(5), 3, Duration::seconds(2)).unwrap();
        let user_id = service.register_user("Secret99").unwrap();

        for _ in 0..wrong {
            prop_assert_eq!(service.authenticate_user("nope", at(0)).unwrap(), None);
        }
        // Attempts while blocked are not counted
        let failures = gatekeepers.gatekeeper().unwrap().unwrap().failed_attempt_count();
        prop_assert_eq!(failures, wrong.min(3) as u32);

        prop_assert_eq!(service.authenticate_user("Secret99", at(2000)).unwrap(), Some(user_id));
        let gatekeeper = gatekeepers.gatekeeper().unwrap().unwrap();
        prop_assert_eq!(gatekeeper.failed_attempt_count(), 0);
        prop_assert!(gatekeeper.access_denied_at().is_none());
        prop_assert!(service.is_user_authenticated(at(7000)).unwrap());
        prop_assert!(!service.is_user_authenticated(at(7001)).unwrap());
    }
}
