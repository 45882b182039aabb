//! Service registry and per-service health endpoints.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use shared::analysis::ServiceHealth;

/// Response for `GET /api/v1/services`.
#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    /// Number of known services.
    pub count: usize,
    /// Service names, sorted.
    pub services: Vec<String>,
}

/// Creates the services routes.
pub fn services_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/services", get(list_services))
        .route("/api/v1/services/{service}/health", get(service_health))
        .with_state(state)
}

async fn list_services(State(state): State<AppState>) -> Json<ServicesResponse> {
    let services = state.queries().services();
    Json(ServicesResponse {
        count: services.len(),
        services,
    })
}

async fn service_health(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Json<ServiceHealth> {
    Json(state.queries().service_health(&service))
}
