use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use nodewatch_core::app::NodeMonitor;
use nodewatch_core::config::MonitorConfig;
use nodewatch_core::domain::{JobId, NodeId, PersistedStatus};
use nodewatch_core::ports::{
    IdGenerator, LiveStatusProvider, PersistedStatusProvider, SystemClock, UlidGenerator,
};

/// Compute node liveness check for one job.
#[derive(Debug, Parser)]
#[command(name = "nodewatch", version)]
struct Cli {
    /// JSON config file (overridden by NODEWATCH_* env vars and flags).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Node stats store (JSON Lines).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a fresh job id.
    NewJob,

    /// Run one reconciliation pass and record departed nodes.
    Check {
        #[arg(long)]
        job: JobId,

        /// Detect only, record nothing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Record a node status directly.
    Mark {
        #[arg(long)]
        job: JobId,

        #[arg(long)]
        node: String,

        /// up, down or error
        #[arg(long)]
        status: PersistedStatus,
    },

    /// Print the latest recorded status per node.
    Status {
        #[arg(long)]
        job: JobId,
    },

    /// Print what the live status command reports right now.
    Live,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<MonitorConfig> {
    let base = match &cli.config {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::default(),
    };
    let mut config = base.with_env()?;
    if let Some(store) = &cli.store {
        config.store_path = store.clone();
    }
    debug!(?config, "loaded configuration");
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::NewJob => {
            let job_id = UlidGenerator::new(SystemClock).generate_job_id();
            info!(%job_id, "created job id");
            println!("{job_id}");
        }
        Command::Check { job, dry_run } => {
            let monitor = NodeMonitor::new(
                config.live_provider()?,
                Arc::new(config.store()),
                SystemClock,
            )
            .with_dry_run(config.dry_run || dry_run);
            let report = monitor
                .run_pass(job)
                .await
                .with_context(|| format!("monitor pass for {job} failed"))?;
            print_json(&report)?;
        }
        Command::Mark { job, node, status } => {
            let monitor = NodeMonitor::new(
                config.live_provider()?,
                Arc::new(config.store()),
                SystemClock,
            );
            let record = monitor.mark(job, NodeId::new(node), status).await?;
            info!(store = %config.store_path.display(), "node status written");
            print_json(&record)?;
        }
        Command::Status { job } => {
            let snapshot = config.store().fetch_persisted_status(job).await?;
            print_json(&snapshot)?;
        }
        Command::Live => {
            let snapshot = config.live_provider()?.fetch_live_status().await?;
            print_json(&snapshot)?;
        }
    }
    Ok(())
}
