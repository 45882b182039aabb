//! Metric query endpoint.

use super::params::parse_limit;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::query::RecentMetrics;

/// Query parameters for `GET /api/v1/metrics`.
#[derive(Debug, Default, Deserialize)]
pub struct MetricQueryParams {
    /// Maximum points to return.
    pub limit: Option<String>,
    /// Exact service name.
    pub service: Option<String>,
    /// Exact metric name.
    pub metric_name: Option<String>,
}

/// Creates the metrics routes.
pub fn metrics_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/metrics", get(recent_metrics))
        .with_state(state)
}

async fn recent_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricQueryParams>,
) -> Json<RecentMetrics> {
    Json(state.queries().recent_metrics(
        parse_limit(params.limit.as_deref()),
        params.service.as_deref(),
        params.metric_name.as_deref(),
    ))
}
