//! Receiver status, store statistics and reset endpoints.

use crate::grpc::ReceiverStatus;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use shared::storage::StoreStats;

/// Response for `DELETE /api/v1/telemetry`.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    /// Always true.
    pub cleared: bool,
}

/// Creates the status routes.
pub fn status_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/receiver/status", get(receiver_status))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/telemetry", delete(clear))
        .with_state(state)
}

async fn receiver_status(State(state): State<AppState>) -> Json<ReceiverStatus> {
    Json(state.receiver_status())
}

async fn stats(State(state): State<AppState>) -> Json<StoreStats> {
    Json(state.queries().stats())
}

async fn clear(State(state): State<AppState>) -> Json<ClearResponse> {
    state.queries().clear();
    Json(ClearResponse { cleared: true })
}
