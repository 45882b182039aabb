//! Error, incident and code-location endpoints.

use super::params::{parse_flag, parse_limit, parse_minutes};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::analysis::IncidentReport;
use shared::query::{CodeLocations, ErrorsResult};

/// Query parameters for `GET /api/v1/errors`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorQueryParams {
    /// Maximum spans and maximum logs to return.
    pub limit: Option<String>,
    /// Look-back window.
    pub since_minutes: Option<String>,
}

/// Query parameters for `GET /api/v1/incident`.
#[derive(Debug, Default, Deserialize)]
pub struct IncidentQueryParams {
    /// Look-back window.
    pub since_minutes: Option<String>,
}

/// Query parameters for `GET /api/v1/code-locations`.
#[derive(Debug, Default, Deserialize)]
pub struct CodeLocationQueryParams {
    /// Substring of the source file path.
    pub filepath: Option<String>,
    /// Substring of the function name.
    pub function: Option<String>,
    /// Exact service name.
    pub service: Option<String>,
    /// Only erroneous spans and logs.
    pub errors_only: Option<String>,
    /// Maximum locations to return.
    pub limit: Option<String>,
}

/// Creates the analysis routes.
pub fn analysis_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/errors", get(errors))
        .route("/api/v1/incident", get(incident))
        .route("/api/v1/code-locations", get(code_locations))
        .with_state(state)
}

async fn errors(
    State(state): State<AppState>,
    Query(params): Query<ErrorQueryParams>,
) -> Json<ErrorsResult> {
    Json(state.queries().errors(
        parse_limit(params.limit.as_deref()),
        parse_minutes(params.since_minutes.as_deref()),
    ))
}

async fn incident(
    State(state): State<AppState>,
    Query(params): Query<IncidentQueryParams>,
) -> Json<IncidentReport> {
    Json(
        state
            .queries()
            .analyze_incident(parse_minutes(params.since_minutes.as_deref())),
    )
}

async fn code_locations(
    State(state): State<AppState>,
    Query(params): Query<CodeLocationQueryParams>,
) -> Json<CodeLocations> {
    Json(state.queries().code_locations(
        params.filepath.as_deref(),
        params.function.as_deref(),
        params.service.as_deref(),
        parse_flag(params.errors_only.as_deref()),
        parse_limit(params.limit.as_deref()),
    ))
}
