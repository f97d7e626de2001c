// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::health::HEALTH_PORT;
use crate::liveness::HEALTHY_FILE_NAME;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const TEST: &str = "test";

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_GRACE: Duration = Duration::from_secs(10);
const DEFAULT_WATCHDOG_THRESHOLD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Guard {
    #[serde(rename = "kubeguard")]
    pub kubeguard: GuardBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuardBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub k8s: Option<K8S>,
    pub probe: Option<Probe>,
    pub shutdown: Option<Shutdown>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct K8S {
    /// Path to a kubeconfig file; empty or absent means in-cluster config.
    pub kubeconfig: Option<String>,
    pub namespace: Option<String>,
    #[serde(rename = "label_selector")]
    pub label_selector: Option<String>,
    pub clues: Option<Vec<String>>,
    /// Replica count the resolved deployments are scaled to while draining.
    #[serde(rename = "drain_replicas")]
    pub drain_replicas: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Probe {
    pub port: Option<u16>,
    #[serde(rename = "healthy_file")]
    pub healthy_file: Option<String>,
    /// Time budget of the drain sequence before the overall status flips.
    #[serde(rename = "watchdog_threshold", with = "humantime_serde", default)]
    pub watchdog_threshold: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Shutdown {
    #[serde(with = "humantime_serde", default)]
    pub grace: Option<Duration>,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn k8s(&self) -> Option<&K8S>;
    fn probe(&self) -> Option<&Probe>;
    fn kubeconfig(&self) -> &str;
    fn namespace(&self) -> &str;
    fn label_selector(&self) -> &str;
    fn clues(&self) -> &[String];
    fn drain_replicas(&self) -> Option<i32>;
    fn health_port(&self) -> u16;
    fn healthy_file(&self) -> &str;
    fn watchdog_threshold(&self) -> Duration;
    fn grace(&self) -> Duration;
}

// Config type alias for convenience
pub type Config = Guard;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.kubeguard.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.kubeguard.env == PROD
    }

    fn is_test(&self) -> bool {
        self.kubeguard.env == TEST
    }

    fn k8s(&self) -> Option<&K8S> {
        self.kubeguard.k8s.as_ref()
    }

    fn probe(&self) -> Option<&Probe> {
        self.kubeguard.probe.as_ref()
    }

    fn kubeconfig(&self) -> &str {
        self.k8s()
            .and_then(|k8s| k8s.kubeconfig.as_deref())
            .unwrap_or("")
    }

    fn namespace(&self) -> &str {
        self.k8s()
            .and_then(|k8s| k8s.namespace.as_deref())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    fn label_selector(&self) -> &str {
        self.k8s()
            .and_then(|k8s| k8s.label_selector.as_deref())
            .unwrap_or("")
    }

    fn clues(&self) -> &[String] {
        self.k8s()
            .and_then(|k8s| k8s.clues.as_deref())
            .unwrap_or(&[])
    }

    fn drain_replicas(&self) -> Option<i32> {
        self.k8s().and_then(|k8s| k8s.drain_replicas)
    }

    fn health_port(&self) -> u16 {
        self.probe().and_then(|p| p.port).unwrap_or(HEALTH_PORT)
    }

    fn healthy_file(&self) -> &str {
        self.probe()
            .and_then(|p| p.healthy_file.as_deref())
            .unwrap_or(HEALTHY_FILE_NAME)
    }

    fn watchdog_threshold(&self) -> Duration {
        self.probe()
            .and_then(|p| p.watchdog_threshold)
            .unwrap_or(DEFAULT_WATCHDOG_THRESHOLD)
    }

    fn grace(&self) -> Duration {
        self.kubeguard
            .shutdown
            .as_ref()
            .and_then(|s| s.grace)
            .unwrap_or(DEFAULT_GRACE)
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        // Read file
        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::parse(&data).with_context(|| format!("unmarshal yaml from {:?}", abs_path))
    }

    /// Parses and validates configuration from YAML text.
    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Guard = serde_yaml::from_str(data)?;

        if let Some(replicas) = cfg.drain_replicas() {
            if replicas < 0 {
                anyhow::bail!("k8s.drain_replicas must not be negative (got {})", replicas);
            }
        }

        if cfg.clues().iter().any(|clue| clue.is_empty()) {
            anyhow::bail!("k8s.clues must not contain empty clues");
        }

        Ok(cfg)
    }
}


// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
