// Main entrypoint for the kubeguard binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use kubeguard::app::App;
use kubeguard::client::{ControlPlane, KubeControlPlane};
use kubeguard::config::{Config, ConfigTrait};
use kubeguard::health::HealthRegistry;
use kubeguard::resolver::NameResolver;
use kubeguard::scale::ScaleController;

const CONFIG_PATH: &str = "cfg/kubeguard.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/kubeguard.cfg.local.yaml";

/// kubeguard - liveness, scaling and graceful termination for cluster workloads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve health checks until SIGTERM, then drain and exit
    Serve,
    /// Print the deployment each configured clue resolves to
    Resolve {
        /// Clues to resolve instead of the configured ones
        #[arg(long = "clue")]
        clues: Vec<String>,
    },
    /// Print the replica count of a deployment
    Replicas { deployment: String },
    /// Set the replica count of a deployment
    Scale { deployment: String, replicas: i32 },
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        return Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path));
    }

    match Config::load(CONFIG_PATH_LOCAL) {
        Ok(cfg) => Ok(cfg),
        Err(_) => Config::load(CONFIG_PATH)
            .with_context(|| format!("failed to load config from {}", CONFIG_PATH)),
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

async fn control_plane(cfg: &Config) -> Result<Arc<dyn ControlPlane>> {
    let client = KubeControlPlane::connect(cfg.kubeconfig())
        .await
        .context("failed to build cluster client")?;
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = load_cfg(args.cfg)?;
    configure_logger(&cfg);

    info!(
        component = "config",
        event = "load_success",
        namespace = cfg.namespace(),
        "config loaded"
    );

    match args.command {
        Command::Serve => {
            let client = if cfg.drain_replicas().is_some() && !cfg.clues().is_empty() {
                Some(control_plane(&cfg).await?)
            } else {
                None
            };
            let (registry, service) = HealthRegistry::new();
            let app = App::new(cfg, CancellationToken::new(), registry, client);
            app.serve(service).await
        }
        Command::Resolve { clues } => {
            let clues = if clues.is_empty() {
                cfg.clues().to_vec()
            } else {
                clues
            };
            let resolver = NameResolver::new(control_plane(&cfg).await?);
            let pairs = resolver
                .read_deployment_names(cfg.namespace(), cfg.label_selector(), &clues)
                .await?;
            for (clue, deployment) in pairs {
                println!("{}\t{}", clue, deployment);
            }
            Ok(())
        }
        Command::Replicas { deployment } => {
            let scaler = ScaleController::new(control_plane(&cfg).await?);
            let replicas = scaler.get_replicas(cfg.namespace(), &deployment).await?;
            println!("{} = {}", deployment, replicas);
            Ok(())
        }
        Command::Scale {
            deployment,
            replicas,
        } => {
            let scaler = ScaleController::new(control_plane(&cfg).await?);
            let outcome = scaler
                .set_replicas(replicas, cfg.namespace(), &deployment)
                .await?;
            if outcome.changed {
                println!("{} scaled to {}", deployment, outcome.replicas);
            } else {
                println!("{} already at {}", deployment, outcome.replicas);
            }
            Ok(())
        }
    }
}
