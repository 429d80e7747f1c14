//! rollcalld — the rollcall daemon.
//!
//! Single binary that assembles the rollcall subsystems:
//! - Heartbeat store (in-memory, sliding TTL)
//! - Rolling floor tracker
//! - Evaluator + alert ticker
//! - Expired heartbeat reaper
//! - REST API
//!
//! # Usage
//!
//! ```text
//! rollcalld run --config /etc/rollcall/rollcall.toml --port 8080
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rollcall_alert::{AlertTicker, Dispatcher, Evaluator, LogSink};
use rollcall_core::RollcallConfig;
use rollcall_floor::RollingFloorTracker;
use rollcall_heartbeat::HeartbeatStore;

#[derive(Parser)]
#[command(name = "rollcalld", about = "Rollcall daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Receive heartbeats and alert on missing or extra running units.
    Run {
        /// Path to a rollcall.toml file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Run { config, port } => {
            let mut config = match config {
                Some(path) => RollcallConfig::from_file(&path)?,
                None => RollcallConfig::default(),
            };
            if let Some(port) = port {
                config.server.port = port;
            }
            run(config).await
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rollcalld=debug,rollcall=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: RollcallConfig) -> anyhow::Result<()> {
    config.validate()?;
    info!("rollcall daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let heartbeats = Arc::new(HeartbeatStore::new(config.heartbeat_ttl()?));
    info!(ttl = ?heartbeats.ttl(), "heartbeat store initialized");

    let floors = Arc::new(RollingFloorTracker::new(config.floor.history_capacity));
    info!(capacity = floors.capacity(), "floor tracker initialized");

    // No delivery channel is wired yet, so both sinks log.
    let sink = Arc::new(LogSink);
    let dispatcher = Dispatcher::new(sink.clone(), sink).with_timeout(config.sink_timeout()?);
    info!(sink_timeout = ?dispatcher.timeout(), "alert dispatcher initialized");

    let evaluator = Arc::new(Evaluator::new(
        Arc::clone(&heartbeats),
        Arc::clone(&floors),
        dispatcher,
    ));

    // ── Start background tasks ─────────────────────────────────

    let mut ticker = AlertTicker::new(evaluator, config.tick_interval()?);
    ticker.start();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper_handle = tokio::spawn(run_reaper(
        Arc::clone(&heartbeats),
        config.reap_interval()?,
        shutdown_rx,
    ));

    // ── Start API server ───────────────────────────────────────

    let router = rollcall_api::build_router(heartbeats, floors);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, "API server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Clean up.
    ticker.stop().await;
    let _ = reaper_handle.await;

    info!("rollcall daemon stopped");
    Ok(())
}

/// Periodically drop expired heartbeat entries.
async fn run_reaper(
    heartbeats: Arc<HeartbeatStore>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let reaped = heartbeats.reap_expired(tokio::time::Instant::now()).await;
                if reaped > 0 {
                    info!(count = reaped, "reaped expired heartbeats");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}
