//! Transfer sync daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                   TRANSFER SYNC                      │
//!                 │                                                      │
//!   Chain node    │  ┌────────────┐   ┌─────────────┐   ┌─────────────┐  │
//!   ──────────────┼─▶│   chain    │──▶│    sync     │──▶│   sink      │──┼──▶ Transfers
//!   heads, logs,  │  │ RpcClient  │   │ HeadTracker │   │ (LogSink)   │  │
//!   blocks        │  └────────────┘   │ BatchScanner│   └─────────────┘  │
//!                 │                   └──────┬──────┘                    │
//!                 │                          ▼                           │
//!                 │                   ┌─────────────┐                    │
//!                 │                   │ checkpoint  │                    │
//!                 │                   └─────────────┘                    │
//!                 │                                                      │
//!                 │  config · observability · lifecycle · admin          │
//!                 └──────────────────────────────────────────────────────┘
//! ```
//!
//! The tracker restarts with backoff when the subscription drops or a
//! window fails, resuming from the stored checkpoint.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use eth_transfer_sync::admin::{self, AdminState};
use eth_transfer_sync::chain::{ChainRpc, RpcClient};
use eth_transfer_sync::config::{check_daemon_endpoint, load_config, parse_assets, WatcherConfig};
use eth_transfer_sync::lifecycle::{run_with_restarts, signals::shutdown_on_signal, Shutdown};
use eth_transfer_sync::observability::{logging, metrics};
use eth_transfer_sync::resilience::RestartBackoff;
use eth_transfer_sync::sync::{
    BatchScanner, CheckpointStore, FileCheckpoint, HeadTracker, LogSink, MemoryCheckpoint,
    SyncStatus,
};
use eth_transfer_sync::transfer::TransferClassifier;

#[derive(Parser)]
#[command(name = "transfer-sync")]
#[command(about = "Follow chain heads and extract native and ERC20 transfers", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "TRANSFER_SYNC_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WatcherConfig::default(),
    };
    check_daemon_endpoint(&config)?;

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "transfer-sync starting");
    tracing::info!(
        rpc_url = %config.chain.rpc_url,
        failovers = config.chain.failover_urls.len(),
        window_size = config.sync.window_size,
        assets = config.sync.assets.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = RpcClient::connect(config.chain.clone()).await?;
    if !client.is_healthy().await {
        tracing::warn!(rpc_url = %config.chain.rpc_url, "Chain node not reachable yet, will keep retrying");
    }
    let chain: Arc<dyn ChainRpc> = Arc::new(client);
    let checkpoint: Arc<dyn CheckpointStore> = match &config.sync.checkpoint_path {
        Some(path) => Arc::new(FileCheckpoint::new(path, config.sync.start_height)),
        None => {
            tracing::warn!("No checkpoint_path configured, progress is kept in memory only");
            Arc::new(MemoryCheckpoint::new(config.sync.start_height))
        }
    };
    let classifier = TransferClassifier::new(parse_assets(&config.sync.assets)?);
    let status = Arc::new(SyncStatus::new());

    let scanner = BatchScanner::new(chain.clone(), checkpoint, Arc::new(LogSink), classifier)
        .with_status(status.clone());
    let tracker = HeadTracker::new(chain, scanner).with_window_size(config.sync.window_size);

    let shutdown = Arc::new(Shutdown::new());

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(config.admin.bind_address.as_str()).await?;
        let state = AdminState {
            status: status.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let rx = shutdown.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, rx).await {
                tracing::error!(error = %e, "Admin server failed");
            }
        }))
    } else {
        None
    };

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_on_signal(&signal_shutdown).await;
    });

    let backoff = RestartBackoff::new(
        config.sync.restart_base_delay_ms,
        config.sync.restart_max_delay_ms,
    );
    run_with_restarts(&tracker, backoff, &shutdown).await;

    shutdown.trigger();
    if let Some(task) = admin_task {
        let _ = task.await;
    }

    let final_status = status.snapshot();
    tracing::info!(
        checkpoint = final_status.checkpoint,
        transfers = final_status.transfers_delivered,
        "Shutdown complete"
    );
    Ok(())
}
