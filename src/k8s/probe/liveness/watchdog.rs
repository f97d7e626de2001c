// Duration watchdog: flips a service to not serving once an operation
// has run longer than its time budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, warn};

use super::{LivenessGuard, LivenessState, ThresholdIsTooShortError};

const MIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Watchdog over one service name.
///
/// Latches through the wrapped [`LivenessGuard`], so a breach is also seen
/// by every other user of that guard.
pub struct AliveGuard {
    guard: Arc<LivenessGuard>,
    threshold: Duration,
    service_name: String,
    // Short-circuit once this watchdog has latched.
    failed: AtomicBool,
}

impl AliveGuard {
    pub fn new(
        guard: Arc<LivenessGuard>,
        threshold: Duration,
        service_name: impl Into<String>,
    ) -> Self {
        let threshold = if threshold < MIN_THRESHOLD {
            warn!(
                component = "liveness",
                error = %ThresholdIsTooShortError,
                "min watchdog threshold is 1ms (threshold set up as 1ms)"
            );
            MIN_THRESHOLD
        } else {
            threshold
        };

        Self {
            guard,
            threshold,
            service_name: service_name.into(),
            failed: AtomicBool::new(false),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub async fn state(&self) -> LivenessState {
        if self.failed.load(Ordering::Acquire) {
            return LivenessState::NotServing;
        }
        self.guard.state(&self.service_name).await
    }

    /// Latches the service as not serving if more than the threshold has
    /// passed since `start_time`. Returns true only for the call that
    /// latched; that call alone reports NOT_SERVING.
    pub async fn check_elapsed(&self, start_time: Instant) -> bool {
        if self.failed.load(Ordering::Acquire) {
            return false;
        }

        let elapsed = start_time.elapsed();
        if elapsed <= self.threshold {
            return false;
        }

        let latched = self.guard.mark_failed(&self.service_name).await;
        self.failed.store(true, Ordering::Release);
        if latched {
            error!(
                component = "liveness",
                event = "threshold_exceeded",
                service = %self.service_name,
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.threshold.as_millis() as u64,
                "operation exceeded its time budget"
            );
        }
        latched
    }
}

/// Watchdog over the overall server status (the empty service name).
pub fn app_alive_guard(guard: Arc<LivenessGuard>, threshold: Duration) -> AliveGuard {
    AliveGuard::new(guard, threshold, "")
}
