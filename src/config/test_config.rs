use super::{GuardBox, Config};
use std::time::Duration;

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    Config {
        kubeguard: GuardBox {
            env: super::TEST.to_string(),
            logs: Some(super::Logs {
                level: Some("debug".to_string()),
            }),
            k8s: Some(super::K8S {
                kubeconfig: None,
                namespace: Some("basketball-uat".to_string()),
                label_selector: Some("versionsvc=2-2-3".to_string()),
                clues: Some(vec!["score-diff".to_string(), "race".to_string()]),
                drain_replicas: Some(0),
            }),
            probe: Some(super::Probe {
                port: Some(19666),
                healthy_file: Some("/tmp/kubeguard-test-healthy".to_string()),
                watchdog_threshold: Some(Duration::from_millis(200)),
            }),
            shutdown: Some(super::Shutdown {
                grace: Some(Duration::from_secs(1)),
            }),
        },
    }
}
