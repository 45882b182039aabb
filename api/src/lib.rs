//! otelwatch API Server
//!
//! Wires one shared telemetry store to its two ingestion sources, the
//! OTLP JSON export directory watcher and the OTLP gRPC receiver, and serves
//! the query and incident-analysis operations as a JSON HTTP API.
//!
//! # Architecture
//!
//! - [`watcher`] tails `.json`/`.jsonl` exports into the store
//! - [`grpc`] receives OTLP traces, logs and metrics over gRPC
//! - the HTTP routes read through [`shared::query::QueryService`]
//!
//! Either ingestion source may fail to start; the server then logs the
//! failure and keeps serving with the sources that did start.
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
pub mod grpc;
mod routes;
mod state;
pub mod watcher;

pub use config::Config;
pub use state::AppState;

use anyhow::{Context, Result};
use axum::Router;
use grpc::OtlpReceiver;
use shared::storage::TelemetryStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use watcher::TelemetryWatcher;

/// Runs the otelwatch API server.
///
/// This function initializes the server with configuration from environment variables
/// and starts listening for incoming connections. It handles graceful shutdown on
/// SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The HTTP API fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the otelwatch API server with the provided configuration.
///
/// This is useful for testing or when you want to provide configuration programmatically.
///
/// # Errors
///
/// Returns an error if:
/// - The retention capacities are invalid
/// - The HTTP API fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    config
        .retention
        .check()
        .context("invalid store capacities")?;
    let addr = config.socket_addr()?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        grpc_port = config.grpc_port,
        telemetry_dir = %config.telemetry_dir.display(),
        max_spans = config.retention.max_spans,
        max_logs = config.retention.max_logs,
        max_metrics = config.retention.max_metrics,
        "otelwatch API server starting"
    );

    let store = Arc::new(TelemetryStore::new(config.retention.clone()));

    let mut watcher = match TelemetryWatcher::start(
        Arc::clone(&store),
        &config.telemetry_dir,
        config.poll_interval,
    )
    .await
    {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::error!(error = %e, "Telemetry watcher failed to start, continuing without it");
            None
        }
    };

    let mut receiver = OtlpReceiver::new(Arc::clone(&store), config.grpc_port);
    if let Err(e) = receiver.start().await {
        tracing::error!(error = %e, "OTLP gRPC receiver failed to start, continuing without it");
    }

    let state = AppState::new(store, receiver.state());
    let app = create_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP API to {addr}"))?;

    tracing::info!(%addr, "Listening for connections");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(ref mut watcher) = watcher {
        watcher.stop().await;
    }
    if let Err(e) = receiver.stop().await {
        tracing::warn!(error = %e, "OTLP gRPC receiver did not stop cleanly");
    }

    served?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes(state.clone()))
        .merge(routes::traces_routes(state.clone()))
        .merge(routes::logs_routes(state.clone()))
        .merge(routes::metrics_routes(state.clone()))
        .merge(routes::analysis_routes(state.clone()))
        .merge(routes::services_routes(state.clone()))
        .merge(routes::status_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
