//! Maps `Box<dyn Error>` from trait boundaries to typed `FbcError`.
//!
//! The traits in `fbc_traits` use `Box<dyn Error + Send + Sync>` so drivers
//! can pick their own error types; this module converts those to our typed
//! error enum, with an optional feature-gated path for `fbc_hardware::HwError`
//! downcasting.

use crate::error::FbcError;

/// Map a trait-boundary error to a typed `FbcError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> FbcError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<fbc_hardware::error::HwError>() {
            return match hw {
                fbc_hardware::error::HwError::Timeout => FbcError::Timeout,
                other => FbcError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        FbcError::Timeout
    } else {
        FbcError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_fallback_detects_timeouts() {
        let e = std::io::Error::other("encoder Timeout after 5ms");
        assert!(matches!(map_hw_error(&e), FbcError::Timeout));
        let e = std::io::Error::other("bus off");
        assert!(matches!(map_hw_error(&e), FbcError::Hardware(m) if m == "bus off"));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_errors_are_downcast() {
        use fbc_hardware::error::HwError;
        assert!(matches!(map_hw_error(&HwError::Timeout), FbcError::Timeout));
        assert!(matches!(
            map_hw_error(&HwError::Fault("overcurrent".into())),
            FbcError::HardwareFault(_)
        ));
    }
}
