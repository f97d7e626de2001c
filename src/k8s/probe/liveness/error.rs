// Error definitions for liveness guards

use std::fmt;

#[derive(Debug, Clone)]
pub struct ThresholdIsTooShortError;

impl fmt::Display for ThresholdIsTooShortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "liveness watchdog threshold is too short")
    }
}

impl std::error::Error for ThresholdIsTooShortError {}
