//! Log query endpoint.

use super::params::{parse_flag, parse_limit};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::query::RecentLogs;

/// Query parameters for `GET /api/v1/logs`.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    /// Maximum records to return.
    pub limit: Option<String>,
    /// Exact service name.
    pub service: Option<String>,
    /// Exact severity name, e.g. `WARN`.
    pub severity: Option<String>,
    /// Only `ERROR`/`FATAL` records.
    pub errors_only: Option<String>,
}

/// Creates the logs routes.
pub fn logs_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/logs", get(recent_logs))
        .with_state(state)
}

async fn recent_logs(
    State(state): State<AppState>,
    Query(params): Query<LogQueryParams>,
) -> Json<RecentLogs> {
    Json(state.queries().recent_logs(
        parse_limit(params.limit.as_deref()),
        params.service.as_deref(),
        params.severity.as_deref(),
        parse_flag(params.errors_only.as_deref()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use shared::models::{LogRecord, Severity};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn seeded() -> Router {
        let state = AppState::with_in_memory_store();
        let store = state.store();
        store.add_log(LogRecord::new(Severity::Info, "started", "api"));
        store.add_log(LogRecord::new(Severity::Warn, "slow query", "db"));
        store.add_log(LogRecord::new(Severity::Error, "timeout", "db"));
        store.add_log(LogRecord::new("custom-level", "odd", "api"));
        logs_routes(state)
    }

    #[tokio::test]
    async fn test_filter_by_severity() {
        let (status, body) = get_json(seeded(), "/api/v1/logs?severity=WARN").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["logs"][0]["body"], "slow query");
        assert_eq!(body["filters"]["severity"], "WARN");
    }

    #[tokio::test]
    async fn test_errors_only_and_service() {
        let (_, body) = get_json(seeded(), "/api/v1/logs?errors_only=1&service=db").await;

        assert_eq!(body["count"], 1);
        assert_eq!(body["logs"][0]["is_error"], true);
    }

    #[tokio::test]
    async fn test_verbatim_severity_text() {
        let (_, body) = get_json(seeded(), "/api/v1/logs?severity=custom-level").await;

        assert_eq!(body["count"], 1);
        assert_eq!(body["logs"][0]["is_error"], false);
    }
}
