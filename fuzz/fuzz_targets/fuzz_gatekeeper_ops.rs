#![no_main]

use arbitrary::Arbitrary;
use chrono::{Duration, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use keyward_core::{AuthenticationPolicy, Gatekeeper, GatekeeperError, GatekeeperId};

#[derive(Debug, Arbitrary)]
enum Op {
    Allow,
    Deny,
    Use,
    End,
    Reset,
    Advance(u16),
}

#[derive(Debug, Arbitrary)]
struct Input {
    session_ms: u16,
    max_attempts: u8,
    block_ms: u16,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let Ok(policy) = AuthenticationPolicy::new(
        Duration::milliseconds(i64::from(input.session_ms)),
        u32::from(input.max_attempts),
        Duration::milliseconds(i64::from(input.block_ms)),
    ) else {
        return;
    };
    let mut gatekeeper = Gatekeeper::new(GatekeeperId::generate(), policy);
    let mut now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    for op in input.ops {
        let possible = gatekeeper.is_access_possible(now);
        match op {
            Op::Allow => match gatekeeper.allow_access(now) {
                Ok(session_id) => {
                    assert!(possible);
                    assert!(gatekeeper.has_access(session_id, now));
                    assert_eq!(gatekeeper.failed_attempt_count(), 0);
                }
                Err(e) => assert_eq!(e, GatekeeperError::AccessBlocked),
            },
            Op::Deny => {
                let before = gatekeeper.failed_attempt_count();
                gatekeeper.deny_access(now);
                assert_eq!(gatekeeper.failed_attempt_count(), before.saturating_add(1));
                assert!(gatekeeper.session().is_none());
            }
            Op::Use => {
                if gatekeeper.use_access(now).is_err() {
                    // Either blocked or the session lapsed
                    assert!(!possible || gatekeeper.session().is_some());
                }
            }
            Op::End => {
                let _ = gatekeeper.end_session(now);
            }
            Op::Reset => {
                gatekeeper.reset();
                assert!(gatekeeper.is_access_possible(now));
            }
            Op::Advance(ms) => now += Duration::milliseconds(i64::from(ms)),
        }

        // Blocked implies the threshold was reached
        if !gatekeeper.is_access_possible(now) {
            assert!(gatekeeper.failed_attempt_count() >= gatekeeper.policy().max_failed_attempts());
        }
    }
});
