//! Trace query endpoints.

use super::params::{parse_flag, parse_limit};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::query::{RecentTraces, TraceDetail};

/// Query parameters for `GET /api/v1/traces`.
#[derive(Debug, Default, Deserialize)]
pub struct TraceQueryParams {
    /// Maximum spans to return.
    pub limit: Option<String>,
    /// Exact service name.
    pub service: Option<String>,
    /// Only error spans.
    pub errors_only: Option<String>,
}

/// Creates the traces routes.
pub fn traces_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/traces", get(recent_traces))
        .route("/api/v1/traces/{trace_id}", get(trace_by_id))
        .with_state(state)
}

async fn recent_traces(
    State(state): State<AppState>,
    Query(params): Query<TraceQueryParams>,
) -> Json<RecentTraces> {
    Json(state.queries().recent_traces(
        parse_limit(params.limit.as_deref()),
        params.service.as_deref(),
        parse_flag(params.errors_only.as_deref()),
    ))
}

async fn trace_by_id(
    State(state): State<AppState>,
    Path(trace_id): Path<String>,
) -> Json<TraceDetail> {
    Json(state.queries().trace_by_id(&trace_id))
}
