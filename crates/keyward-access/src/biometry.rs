//! Biometric adapters

use keyward_core::{BiometricAuthenticationService, BiometryType};
use tracing::debug;

/// Adapter for hosts without a biometric sensor
///
/// Reports no biometry; every biometric authentication attempt is declined
/// and therefore counts as a failed attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBiometrics;

impl BiometricAuthenticationService for UnavailableBiometrics {
    fn is_authentication_available(&self) -> bool {
        false
    }

    fn biometry_type(&self) -> BiometryType {
        BiometryType::None
    }

    fn activate(&self) -> keyward_core::Result<()> {
        debug!("Biometry unavailable, skipping activation");
        Ok(())
    }

    fn authenticate(&self) -> keyward_core::Result<bool> {
        Ok(false)
    }
}
