//! Integration tests for log querying.
//!
//! Tests cover:
//! - Recent logs, newest first
//! - Filtering by service, severity and error severities
//! - Trace correlation fields

use axum::http::StatusCode;
use shared::models::{LogRecord, Severity};

use super::common::{get, test_app};

fn seed(state: &api::AppState) {
    let store = state.store();
    store.add_log(LogRecord::new(Severity::Info, "User logged in", "auth-service"));
    store.add_log(LogRecord::new(Severity::Warn, "Token near expiry", "auth-service"));
    store.add_log(
        LogRecord::new(Severity::Error, "Database connection failed", "user-service")
            .with_trace_id("4bf92f3577b34da6a3ce929d0e0e4736")
            .with_span_id("00f067aa0ba902b7"),
    );
    store.add_log(LogRecord::new(Severity::Fatal, "Out of memory", "user-service"));
    store.add_log(LogRecord::new(Severity::Debug, "Cache miss", "user-service"));
}

#[tokio::test]
async fn test_recent_logs_newest_first() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/logs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 5);
    assert_eq!(response["logs"][0]["body"], "Cache miss");
    assert_eq!(response["logs"][4]["body"], "User logged in");
}

#[tokio::test]
async fn test_logs_filter_by_service() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/logs?service=auth-service").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 2);
    assert_eq!(response["filters"]["service"], "auth-service");
    for log in response["logs"].as_array().unwrap() {
        assert_eq!(log["service"], "auth-service");
    }
}

#[tokio::test]
async fn test_logs_filter_by_severity() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/logs?severity=WARN").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 1);
    assert_eq!(response["logs"][0]["body"], "Token near expiry");
    assert_eq!(response["logs"][0]["is_error"], false);
}

#[tokio::test]
async fn test_logs_errors_only_includes_fatal() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/logs?errors_only=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 2);
    let severities: Vec<&str> = response["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["severity"].as_str().unwrap())
        .collect();
    assert_eq!(severities, vec!["FATAL", "ERROR"]);
    assert!(response["logs"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["is_error"] == true));
}

#[tokio::test]
async fn test_logs_carry_trace_correlation() {
    let (app, state) = test_app();
    seed(&state);

    let (_, response) = get(app, "/api/v1/logs?severity=ERROR").await;

    let log = &response["logs"][0];
    assert_eq!(log["trace_id"], "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_eq!(log["span_id"], "00f067aa0ba902b7");
}

#[tokio::test]
async fn test_logs_limit() {
    let (app, state) = test_app();
    seed(&state);

    let (_, response) = get(app, "/api/v1/logs?limit=2").await;

    assert_eq!(response["count"], 2);
    assert_eq!(response["logs"].as_array().unwrap().len(), 2);
}
