#![no_main]

use libfuzzer_sys::fuzz_target;
use keyward_core::types::is_recordable;
use keyward_core::{Gatekeeper, Session};

fuzz_target!(|data: &[u8]| {
    // Try parsing as a session record
    if let Ok(session) = Session::from_bytes(data) {
        // Decoding re-validates the duration
        assert!(session.duration() > chrono::Duration::zero());
        assert!(is_recordable(session.duration()));

        // Anything that decodes must re-encode and decode to the same value
        let reserialized = session.to_bytes().unwrap();
        let session2 = Session::from_bytes(&reserialized).unwrap();
        assert_eq!(session.duration(), session2.duration());
        assert_eq!(session, session2);
    }

    // Try parsing as a full gatekeeper record
    if let Ok(gatekeeper) = Gatekeeper::from_bytes(data) {
        assert!(gatekeeper.policy().max_failed_attempts() > 0);
        let reserialized = gatekeeper.to_bytes().unwrap();
        let gatekeeper2 = Gatekeeper::from_bytes(&reserialized).unwrap();
        assert_eq!(gatekeeper.policy(), gatekeeper2.policy());
        assert_eq!(gatekeeper, gatekeeper2);
    }
});
