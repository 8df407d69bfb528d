//! fleetscaled — the fleetscale daemon.
//!
//! Keeps the mean CPU utilization of one docker compose service between two
//! thresholds by adding or removing one replica per poll interval. Runs
//! until interrupted.
//!
//! # Usage
//!
//! ```text
//! fleetscaled --config /etc/fleetscale/fleetscale.toml
//! fleetscaled --service backend --poll-interval 5s --dry-run
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleetscale_autoscale::{Actuator, Controller};
use fleetscale_core::FleetConfig;
use fleetscale_orchestrator::DockerOrchestrator;

const DEFAULT_CONFIG_PATH: &str = "fleetscale.toml";
const DEFAULT_LOG_FILTER: &str = "info,fleetscaled=debug";

#[derive(Debug, Parser)]
#[command(name = "fleetscaled", about = "CPU-driven replica autoscaler")]
struct Cli {
    /// Config file. Without it, ./fleetscale.toml is used if present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the service name from the config file.
    #[arg(long)]
    service: Option<String>,

    /// Override the poll interval (e.g. "5s", "500ms").
    #[arg(long)]
    poll_interval: Option<String>,

    /// Log scaling decisions without sending them to the orchestrator.
    /// The believed replica count stays at its seeded value.
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Load the config file, falling back to defaults only when no path was
/// given explicitly and the default file does not exist.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<FleetConfig> {
    match explicit {
        Some(path) => Ok(FleetConfig::from_file(path)?),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.is_file() {
                Ok(FleetConfig::from_file(default_path)?)
            } else {
                info!(
                    path = DEFAULT_CONFIG_PATH,
                    "no config file found, using built-in defaults"
                );
                Ok(FleetConfig::default())
            }
        }
    }
}

fn apply_overrides(config: &mut FleetConfig, cli: &Cli) {
    if let Some(service) = &cli.service {
        config.service.name = service.clone();
    }
    if let Some(interval) = &cli.poll_interval {
        config.scaling.poll_interval = interval.clone();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    let settings = config.validate().context("invalid configuration")?;

    info!(
        service = %settings.service,
        min_replicas = settings.bounds.min_replicas(),
        max_replicas = settings.bounds.max_replicas(),
        scale_up_threshold = settings.thresholds.scale_up(),
        scale_down_threshold = settings.thresholds.scale_down(),
        poll_interval_ms = settings.poll_interval.as_millis() as u64,
        resync_every = ?settings.resync_every,
        "fleetscaled starting"
    );

    let orchestrator = DockerOrchestrator::from_settings(&settings.orchestrator);
    let actuator = if cli.dry_run {
        Actuator::dry_run()
    } else {
        Actuator::live()
    };

    let mut controller = Controller::initialize(orchestrator, settings)
        .await?
        .with_actuator(actuator);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let controller_handle = tokio::spawn(async move {
        controller.run(shutdown_rx).await;
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!(error = %e, "failed to listen for ctrl-c, stopping"),
    }
    let _ = shutdown_tx.send(true);

    controller_handle
        .await
        .context("control loop task panicked")?;

    info!("fleetscaled stopped");
    Ok(())
}
