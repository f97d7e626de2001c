// Cleanup run by the termination handler before the grace period.

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::liveness::{disable_liveness_check, remove_healthy_file, AliveGuard, LivenessGuard};
use crate::resolver::NameResolver;
use crate::scale::ScaleController;

/// Deployments to rescale while draining.
#[derive(Debug, Clone)]
pub struct DrainPlan {
    pub namespace: String,
    pub label_selector: String,
    pub clues: Vec<String>,
    pub replicas: i32,
}

/// Marks the process unhealthy, drops the marker file and applies the
/// optional scale plan. Failures are logged; draining always completes.
/// Rescaling that outruns the watchdog's budget flips the overall server
/// status to not serving.
pub struct Drain {
    pub guard: Arc<LivenessGuard>,
    pub watchdog: AliveGuard,
    pub healthy_file: String,
    pub plan: Option<(DrainPlan, NameResolver, ScaleController)>,
}

impl Drain {
    pub async fn run(self) {
        let started = Instant::now();
        disable_liveness_check(&self.guard).await;

        if let Err(e) = remove_healthy_file(&self.healthy_file) {
            warn!(
                component = "drain",
                event = "marker_remove_failed",
                path = %self.healthy_file,
                error = %e,
                "failed to remove healthy marker file"
            );
        }

        let Some((plan, resolver, scaler)) = self.plan else {
            return;
        };

        let pairs = match resolver
            .read_deployment_names(&plan.namespace, &plan.label_selector, &plan.clues)
            .await
        {
            Ok(pairs) => pairs,
            Err(e) => {
                error!(
                    component = "drain",
                    event = "resolve_failed",
                    namespace = %plan.namespace,
                    error = %e,
                    "drain skipped: deployments could not be resolved"
                );
                self.watchdog.check_elapsed(started).await;
                return;
            }
        };
        self.watchdog.check_elapsed(started).await;

        for (clue, deployment) in pairs {
            match scaler
                .set_replicas(plan.replicas, &plan.namespace, &deployment)
                .await
            {
                Ok(outcome) => info!(
                    component = "drain",
                    event = "scaled",
                    clue = %clue,
                    deployment = %deployment,
                    changed = outcome.changed,
                    replicas = outcome.replicas,
                    "deployment drained"
                ),
                Err(e) => error!(
                    component = "drain",
                    event = "scale_failed",
                    clue = %clue,
                    deployment = %deployment,
                    error = %e,
                    "failed to drain deployment"
                ),
            }
            self.watchdog.check_elapsed(started).await;
        }
    }
}
