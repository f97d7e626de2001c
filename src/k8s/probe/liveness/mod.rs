// Package liveness provides Kubernetes liveness reporting: a latching guard
// per service name, a duration watchdog and the legacy marker file.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::health::{self, Health, HealthServer, ServingStatus, StatusReporter};

pub mod error;
pub mod file;
pub mod watchdog;


pub use error::ThresholdIsTooShortError;
pub use file::{create_healthy_file, remove_healthy_file, HEALTHY_FILE_NAME};
pub use watchdog::{app_alive_guard, AliveGuard};

/// Two-valued liveness latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Serving,
    NotServing,
}

impl From<LivenessState> for ServingStatus {
    fn from(state: LivenessState) -> Self {
        match state {
            LivenessState::Serving => ServingStatus::Serving,
            LivenessState::NotServing => ServingStatus::NotServing,
        }
    }
}

/// Reports liveness per service name; once a name is marked failed it is
/// never reported as serving again.
pub struct LivenessGuard {
    reporter: Arc<dyn StatusReporter>,
    // Held across the report so a late SERVING can't overtake a NOT_SERVING.
    failed: tokio::sync::Mutex<HashSet<String>>,
}

impl LivenessGuard {
    pub fn new(reporter: Arc<dyn StatusReporter>) -> Self {
        Self {
            reporter,
            failed: tokio::sync::Mutex::new(HashSet::new()),
        }
    }

    /// Reports `service` as serving unless it has already been marked failed.
    pub async fn serve(&self, service: &str) -> LivenessState {
        let failed = self.failed.lock().await;
        if failed.contains(service) {
            return LivenessState::NotServing;
        }
        self.reporter
            .set_status(service, ServingStatus::Serving)
            .await;
        LivenessState::Serving
    }

    /// Latches `service` as not serving. Returns true for the call that
    /// flipped the latch; later calls are no-ops.
    pub async fn mark_failed(&self, service: &str) -> bool {
        let mut failed = self.failed.lock().await;
        if !failed.insert(service.to_string()) {
            return false;
        }
        self.reporter
            .set_status(service, ServingStatus::NotServing)
            .await;
        error!(
            component = "liveness",
            event = "latched",
            service,
            "service marked as not serving"
        );
        true
    }

    pub async fn state(&self, service: &str) -> LivenessState {
        if self.failed.lock().await.contains(service) {
            LivenessState::NotServing
        } else {
            LivenessState::Serving
        }
    }
}

/// Starts the health server on `port` and reports the `alive` check as
/// serving. The server stops when `shutdown` is cancelled; the task yields
/// the server's error if it could not bind or failed while serving.
pub async fn enable_liveness_check<H: Health>(
    guard: &LivenessGuard,
    service: HealthServer<H>,
    port: u16,
    shutdown: CancellationToken,
) -> JoinHandle<Result<()>> {
    guard.serve(health::CHECK_NAME).await;

    let handle = tokio::task::spawn(async move {
        let result = health::serve(service, port, shutdown).await;
        if let Err(e) = &result {
            error!(
                component = "liveness",
                event = "serve_failed",
                port,
                error = %e,
                "health check server failed"
            );
        }
        result
    });

    info!(
        component = "liveness",
        event = "enabled",
        port,
        check = health::CHECK_NAME,
        "liveness check enabled"
    );
    handle
}

/// Reports the `alive` check as not serving for the rest of the process.
pub async fn disable_liveness_check(guard: &LivenessGuard) {
    guard.mark_failed(health::CHECK_NAME).await;
}
