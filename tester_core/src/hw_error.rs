//! Maps `Box<dyn Error>` from trait boundaries to typed `TesterError`.
//!
//! The traits in `tester_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `tester_hardware::HwError` downcasting.

use crate::error::TesterError;

/// Map a trait-boundary error to a typed `TesterError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TesterError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<tester_hardware::error::HwError>() {
            return match hw {
                tester_hardware::error::HwError::Disconnected => TesterError::Disconnected,
                other => TesterError::Hardware(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("disconnected") {
        TesterError::Disconnected
    } else {
        TesterError::Hardware(s)
    }
}
