//! Liveness endpoint.
//!
//! Per-service health lives under `/api/v1/services/{service}/health`.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

/// Liveness response with a glance at the ingestion side.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" if reachable.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Whether the OTLP gRPC receiver is serving.
    pub receiver_running: bool,
    /// Spans, logs and metric points currently held.
    pub stored_entities: usize,
}

/// Creates the liveness route.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.queries().stats();
    Json(HealthResponse {
        status: "healthy",
        service: "otelwatch-api",
        version: env!("CARGO_PKG_VERSION"),
        receiver_running: state.receiver_status().running,
        stored_entities: stats.span_count + stats.log_count + stats.metric_count,
    })
}
