//! siglink daemon — entry point for the verification and sync service.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use siglink_gateway::{AuthorizationSink, HttpLedgerGateway, LedgerGateway, LogSink};
use siglink_rpc::{AppState, RpcServer};
use siglink_store::Store;
use siglink_store_lmdb::LmdbStore;
use siglink_sync::{CleanupSweeper, SyncEngine, SyncScheduler};
use siglink_types::Timestamp;
use siglink_verification::{ChallengeService, VerificationPipeline};

use config::DaemonConfig;

#[derive(Parser)]
#[command(name = "siglink-daemon", about = "wallet verification and role sync daemon")]
struct Cli {
    /// Port for the HTTP API.
    #[arg(long, env = "SIGLINK_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Base URL of the on-chain ledger REST API.
    #[arg(long, env = "SIGLINK_LEDGER_URL")]
    ledger_url: Option<String>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "SIGLINK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Seconds between scheduled sync runs.
    #[arg(long, env = "SIGLINK_SYNC_INTERVAL_SECS")]
    sync_interval_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SIGLINK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output shape: "text" or "json".
    #[arg(long, env = "SIGLINK_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(&path.display().to_string())
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DaemonConfig::default(),
    };

    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if let Some(url) = &cli.ledger_url {
        config.ledger_url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(secs) = cli.sync_interval_secs {
        config.sync_interval_secs = secs;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install SIGINT handler");
    };
    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // RUST_LOG, when set, wins over the configured level.
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.log_level);
    }
    let log_format = config
        .log_format
        .parse::<siglink_utils::LogFormat>()
        .map_err(anyhow::Error::msg)?;
    siglink_utils::init_tracing(log_format);

    info!(
        port = config.rpc_port,
        ledger = %config.ledger_url,
        data_dir = %config.data_dir.display(),
        "starting siglink daemon"
    );

    let store: Arc<dyn Store> = Arc::new(
        LmdbStore::open(&config.data_dir)
            .with_context(|| format!("opening store at {}", config.data_dir.display()))?,
    );
    let gateway: Arc<dyn LedgerGateway> = Arc::new(HttpLedgerGateway::new(&config.ledger_url));
    let sink: Arc<dyn AuthorizationSink> = Arc::new(LogSink);

    let engine = Arc::new(SyncEngine::new(store.clone(), gateway.clone(), sink.clone()));
    let challenges = Arc::new(ChallengeService::new(
        store.clone(),
        config.challenge_config(),
    ));
    let pipeline = Arc::new(VerificationPipeline::new(
        store.clone(),
        gateway.clone(),
        sink.clone(),
        engine.clone(),
    ));
    let scheduler = Arc::new(SyncScheduler::new(
        engine.clone(),
        config.scheduler_config(),
    ));
    let sweeper = CleanupSweeper::new(store.clone(), config.cleanup_config());

    let state = Arc::new(AppState {
        store,
        challenges,
        pipeline,
        scheduler: scheduler.clone(),
        engine,
        sink,
    });
    let server = RpcServer::new(config.rpc_port, state);

    let scheduler_handle = scheduler.start();

    let (cleanup_stop, mut cleanup_stopped) = tokio::sync::watch::channel(false);
    let cleanup_interval = Duration::from_secs(config.cleanup_interval_secs);
    let cleanup_handle = tokio::spawn(async move {
        let mut timer = tokio::time::interval(cleanup_interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        timer.tick().await;
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if let Err(e) = sweeper.run_once(Timestamp::now()) {
                        error!(error = %e, "cleanup sweep failed");
                    }
                }
                _ = cleanup_stopped.changed() => break,
            }
        }
    });

    tokio::select! {
        result = server.start() => {
            result.map_err(|e| anyhow::anyhow!("rpc server failed: {e}"))?;
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received — stopping");
        }
    }

    scheduler.stop();
    let _ = cleanup_stop.send(true);
    let _ = scheduler_handle.await;
    let _ = cleanup_handle.await;

    info!("siglink daemon exited cleanly");
    Ok(())
}
