// Long-running guard process: health server, marker file and SIGTERM handling.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::ControlPlane;
use crate::config::{Config, ConfigTrait};
use crate::health::{Health, HealthRegistry, HealthServer};
use crate::liveness::{self, create_healthy_file, remove_healthy_file, LivenessGuard};
use crate::resolver::NameResolver;
use crate::scale::ScaleController;
use crate::shutdown::TerminationHandler;

use super::{Drain, DrainPlan};

/// Encapsulates the guard process state.
pub struct App {
    cfg: Config,
    shutdown_token: CancellationToken,
    guard: Arc<LivenessGuard>,
    control_plane: Option<Arc<dyn ControlPlane>>,
}

impl App {
    /// Creates the application. `control_plane` is only needed when the
    /// configuration asks for deployments to be rescaled while draining.
    pub fn new(
        cfg: Config,
        shutdown_token: CancellationToken,
        registry: HealthRegistry,
        control_plane: Option<Arc<dyn ControlPlane>>,
    ) -> Self {
        let guard = Arc::new(LivenessGuard::new(Arc::new(registry)));
        Self {
            cfg,
            shutdown_token,
            guard,
            control_plane,
        }
    }

    pub fn guard(&self) -> Arc<LivenessGuard> {
        self.guard.clone()
    }

    /// The cleanup the termination handler runs before exiting.
    pub fn drain(&self) -> Drain {
        let plan = match (self.cfg.drain_replicas(), &self.control_plane) {
            (Some(replicas), Some(client)) if !self.cfg.clues().is_empty() => Some((
                DrainPlan {
                    namespace: self.cfg.namespace().to_string(),
                    label_selector: self.cfg.label_selector().to_string(),
                    clues: self.cfg.clues().to_vec(),
                    replicas,
                },
                NameResolver::new(client.clone()),
                ScaleController::new(client.clone()),
            )),
            _ => None,
        };

        Drain {
            guard: self.guard.clone(),
            watchdog: liveness::app_alive_guard(
                self.guard.clone(),
                self.cfg.watchdog_threshold(),
            ),
            healthy_file: self.cfg.healthy_file().to_string(),
            plan,
        }
    }

    /// Starts reporting liveness and installs the termination handler.
    /// Returns once the health server stops; a server failure is returned
    /// after the healthy marker file has been removed.
    pub async fn serve<H: Health>(&self, service: HealthServer<H>) -> Result<()> {
        let server = liveness::enable_liveness_check(
            &self.guard,
            service,
            self.cfg.health_port(),
            self.shutdown_token.clone(),
        )
        .await;

        create_healthy_file(self.cfg.healthy_file()).with_context(|| {
            format!("failed to create healthy file {}", self.cfg.healthy_file())
        })?;

        let drain = self.drain();
        TerminationHandler::new(self.cfg.grace())
            .with_continuation(move || drain.run())
            .spawn()
            .context("failed to install termination handler")?;

        info!(
            component = "app",
            event = "started",
            port = self.cfg.health_port(),
            grace = %humantime::format_duration(self.cfg.grace()),
            "application lifecycle"
        );

        let result = server.await.context("health server task failed")?;
        if result.is_err() {
            liveness::disable_liveness_check(&self.guard).await;
            if let Err(e) = remove_healthy_file(self.cfg.healthy_file()) {
                warn!(
                    component = "app",
                    event = "marker_remove_failed",
                    path = %self.cfg.healthy_file(),
                    error = %e,
                    "failed to remove healthy marker file"
                );
            }
        }
        result
    }
}
