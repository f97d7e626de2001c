// Package health exposes process liveness over the grpc.health.v1 protocol.

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic_health::server::HealthReporter;
use tracing::{debug, info};

pub use tonic_health::pb::health_server::{Health, HealthServer};
pub use tonic_health::ServingStatus;


/// Port the health protocol is served on.
pub const HEALTH_PORT: u16 = 9666;

/// Check name probes query for process liveness.
pub const CHECK_NAME: &str = "alive";

/// Sink for per-service serving status.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn set_status(&self, service: &str, status: ServingStatus);
}

/// Process-wide registry of serving statuses keyed by service name.
///
/// Cheap to clone; every clone reports into the same gRPC health service.
#[derive(Clone)]
pub struct HealthRegistry {
    reporter: HealthReporter,
    statuses: Arc<RwLock<HashMap<String, ServingStatus>>>,
    // Orders writes so the shadow map and the served status agree.
    writes: Arc<tokio::sync::Mutex<()>>,
}

impl HealthRegistry {
    /// Creates the registry and the gRPC service it feeds.
    pub fn new() -> (Self, HealthServer<impl Health>) {
        let (reporter, service) = tonic_health::server::health_reporter();
        let registry = Self {
            reporter,
            statuses: Arc::new(RwLock::new(HashMap::new())),
            writes: Arc::new(tokio::sync::Mutex::new(())),
        };
        (registry, service)
    }

    /// Last status served for `service`, if any.
    pub fn status(&self, service: &str) -> Option<ServingStatus> {
        self.statuses.read().get(service).copied()
    }
}

#[async_trait]
impl StatusReporter for HealthRegistry {
    async fn set_status(&self, service: &str, status: ServingStatus) {
        let _order = self.writes.lock().await;
        let mut reporter = self.reporter.clone();
        reporter.set_service_status(service, status).await;
        self.statuses.write().insert(service.to_string(), status);
        debug!(
            component = "health",
            event = "status_set",
            service,
            status = ?status,
            "serving status updated"
        );
    }
}

/// Serves the health protocol on `port` until `shutdown` is cancelled.
pub async fn serve<H: Health>(
    service: HealthServer<H>,
    port: u16,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(
        component = "health",
        event = "listening",
        addr = %addr,
        "health check server started"
    );

    Server::builder()
        .add_service(service)
        .serve_with_shutdown(addr, shutdown.cancelled_owned())
        .await
        .with_context(|| format!("failed to serve health checks on {}", addr))?;

    info!(
        component = "health",
        event = "stopped",
        addr = %addr,
        "health check server stopped"
    );
    Ok(())
}
