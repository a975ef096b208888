//! bazarr-server - live update service for the Bazarr UI
//!
//! Opens the database, builds the notification hub and serves the SSE,
//! websocket and toast endpoints until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bazarr_common::config::Config;
use bazarr_common::db::init_database;
use bazarr_common::EventHub;
use bazarr_server::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for bazarr-server
#[derive(Parser, Debug)]
#[command(name = "bazarr-server")]
#[command(about = "Live update service for the Bazarr UI")]
#[command(version)]
struct Args {
    /// Address to bind (overrides config file)
    #[arg(long, env = "BAZARR_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "BAZARR_PORT")]
    port: Option<u16>,

    /// Root folder holding bazarr.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to config.toml
    #[arg(short, long, env = "BAZARR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bazarr_server=info,bazarr_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Bazarr server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(args.root_folder.as_deref(), args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!("Root folder: {}", config.root_folder.display());

    let db_path = config.database_path();
    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("Connected to database: {}", db_path.display());
            pool
        }
        Err(e) => {
            error!("Failed to open database {}: {}", db_path.display(), e);
            return Err(e.into());
        }
    };

    let hub = EventHub::from_config(&config.events);
    info!(
        "Event queue capacity {}, toast queue capacity {}",
        config.events.event_queue_capacity, config.events.toast_queue_capacity
    );

    let state = AppState::new(
        pool.clone(),
        hub,
        Duration::from_secs(config.events.sse_keep_alive_secs),
    );
    let app = build_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("bazarr-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // SSE and websocket responses never end on their own
            state.begin_shutdown();
        })
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
