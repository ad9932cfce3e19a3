//! Presensi Hub - Main entry point
//!
//! Attendance ingestion and aggregation service: per-operator scan
//! sessions, roster-driven mutation, and live dashboard aggregates over a
//! shared SQLite ledger.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use presensi_common::config;
use presensi_common::db::{init_database, Ledger};
use presensi_hub::aggregate::Aggregator;
use presensi_hub::api;
use presensi_hub::state::AppState;

/// Command-line arguments for presensi-hub
#[derive(Parser, Debug)]
#[command(name = "presensi-hub")]
#[command(about = "Attendance hub service for Presensi")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "PRESENSI_PORT")]
    port: u16,

    /// Data folder holding the attendance database
    #[arg(short, long, env = "PRESENSI_DATA_FOLDER")]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presensi_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting Presensi Hub on port {}", args.port);

    let data_folder =
        config::resolve_data_folder(args.data_folder.as_deref(), "PRESENSI_DATA_FOLDER")
            .context("Failed to resolve data folder")?;
    info!("Data folder: {}", data_folder.display());

    let pool = init_database(&config::database_path(&data_folder))
        .await
        .context("Failed to initialize database")?;

    let ledger = Ledger::new(pool.clone());
    let state = AppState::new(pool, ledger.clone());

    // Dashboard aggregation runs for the lifetime of the service
    Aggregator::new(ledger, state.event_sender()).spawn();

    let app = api::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
