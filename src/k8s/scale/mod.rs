// Package scale reads and updates deployment replica counts.

use std::sync::Arc;
use tracing::{debug, info};

use crate::client::ControlPlane;
use crate::error::Result;

#[cfg(test)]
mod scale_test;

/// Result of a guarded scale update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleOutcome {
    /// Whether an update was written.
    pub changed: bool,
    /// Replica count observed after the call.
    pub replicas: i32,
}

/// Reads and writes the replica count of deployments.
#[derive(Clone)]
pub struct ScaleController {
    client: Arc<dyn ControlPlane>,
}

impl ScaleController {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    /// Current desired replica count of `deployment_name`.
    pub async fn get_replicas(&self, namespace: &str, deployment_name: &str) -> Result<i32> {
        let scale = self.client.get_scale(namespace, deployment_name).await?;
        Ok(scale.replicas)
    }

    /// Sets the replica count of `deployment_name` to `target`.
    ///
    /// The current count is always read first; when it already equals
    /// `target` nothing is written and `changed` is false. Failures are
    /// returned as they come, with no retry.
    pub async fn set_replicas(
        &self,
        target: i32,
        namespace: &str,
        deployment_name: &str,
    ) -> Result<ScaleOutcome> {
        let current = self.client.get_scale(namespace, deployment_name).await?;
        if current.replicas == target {
            debug!(
                component = "scale",
                event = "unchanged",
                namespace,
                deployment = deployment_name,
                replicas = target,
                "deployment already at target scale"
            );
            return Ok(ScaleOutcome {
                changed: false,
                replicas: current.replicas,
            });
        }

        let stored = self
            .client
            .update_scale(namespace, deployment_name, current.with_replicas(target))
            .await?;

        info!(
            component = "scale",
            event = "scaled",
            namespace,
            deployment = deployment_name,
            from = current.replicas,
            to = stored.replicas,
            "deployment scaled"
        );
        Ok(ScaleOutcome {
            changed: true,
            replicas: stored.replicas,
        })
    }
}
