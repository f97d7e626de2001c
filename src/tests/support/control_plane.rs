// In-memory control plane with call counters.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::client::{ControlPlane, ScaleSnapshot};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct FakeControlPlane {
    names: Vec<String>,
    replicas: Mutex<HashMap<String, i32>>,
    versions: AtomicU64,
    fail_list: Mutex<Option<String>>,
    fail_update: Mutex<Option<String>>,
    latency: Option<Duration>,
    pub lists: AtomicUsize,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub written: Mutex<Vec<(String, i32)>>,
    pub last_selector: Mutex<Option<(String, String)>>,
}

impl FakeControlPlane {
    pub fn with_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_replicas(self, name: &str, replicas: i32) -> Self {
        self.replicas.lock().insert(name.to_string(), replicas);
        self
    }

    /// Every scale write takes `latency` before it lands.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fail_list_with(&self, msg: &str) {
        *self.fail_list.lock() = Some(msg.to_string());
    }

    pub fn fail_update_with(&self, msg: &str) {
        *self.fail_update.lock() = Some(msg.to_string());
    }

    pub fn replicas_of(&self, name: &str) -> Option<i32> {
        self.replicas.lock().get(name).copied()
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_deployment_names(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<String>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        *self.last_selector.lock() = Some((namespace.to_string(), label_selector.to_string()));
        if let Some(msg) = self.fail_list.lock().clone() {
            return Err(Error::control_plane(io::Error::other(msg)));
        }
        Ok(self.names.clone())
    }

    async fn get_scale(&self, _namespace: &str, name: &str) -> Result<ScaleSnapshot> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let replicas = self.replicas.lock().get(name).copied().ok_or_else(|| {
            Error::control_plane(io::Error::new(
                io::ErrorKind::NotFound,
                format!("deployments.apps \"{}\" not found", name),
            ))
        })?;
        Ok(ScaleSnapshot {
            replicas,
            resource_version: Some(self.versions.load(Ordering::SeqCst).to_string()),
        })
    }

    async fn update_scale(
        &self,
        _namespace: &str,
        name: &str,
        scale: ScaleSnapshot,
    ) -> Result<ScaleSnapshot> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(msg) = self.fail_update.lock().clone() {
            return Err(Error::control_plane(io::Error::other(msg)));
        }
        self.written.lock().push((name.to_string(), scale.replicas));
        self.replicas.lock().insert(name.to_string(), scale.replicas);
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ScaleSnapshot {
            replicas: scale.replicas,
            resource_version: Some(version.to_string()),
        })
    }
}
