// Status reporter that remembers every notification it receives.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::health::{ServingStatus, StatusReporter};

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(String, ServingStatus)>>,
    delay: Option<Duration>,
}

impl RecordingReporter {
    /// Reporter that yields for `delay` before recording, widening races.
    pub fn slow(delay: Duration) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    pub fn events(&self) -> Vec<(String, ServingStatus)> {
        self.events.lock().clone()
    }

    pub fn count(&self, service: &str, status: ServingStatus) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|(s, st)| s == service && *st == status)
            .count()
    }

    pub fn last(&self, service: &str) -> Option<ServingStatus> {
        self.events
            .lock()
            .iter()
            .rev()
            .find(|(s, _)| s == service)
            .map(|(_, st)| *st)
    }
}

#[async_trait]
impl StatusReporter for RecordingReporter {
    async fn set_status(&self, service: &str, status: ServingStatus) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.events.lock().push((service.to_string(), status));
    }
}
