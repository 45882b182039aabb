//! Integration tests for health check and general API functionality.
//!
//! Tests cover:
//! - Health check endpoint
//! - Empty store behavior
//! - Stats, services and clearing the store

use axum::http::StatusCode;
use shared::models::{LogRecord, MetricPoint, Severity, Span};

use super::common::{delete, get, test_app};

#[tokio::test]
async fn test_health_check() {
    let (app, _state) = test_app();

    let (status, response) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["service"], "otelwatch-api");
    assert_eq!(response["receiver_running"], false);
    assert_eq!(response["stored_entities"], 0);
}

#[tokio::test]
async fn test_empty_store_returns_empty_results() {
    let (app, _state) = test_app();

    let (status, response) = get(app.clone(), "/api/v1/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 0);
    assert!(response["logs"].as_array().unwrap().is_empty());

    let (status, response) = get(app.clone(), "/api/v1/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 0);

    let (status, response) = get(app.clone(), "/api/v1/traces").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 0);

    let (status, response) = get(app, "/api/v1/services").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 0);
}

#[tokio::test]
async fn test_stats_reports_counts_and_capacity() {
    let (app, state) = test_app();
    state.store().add_span(Span::new("t1", "s1", "GET /", "web"));
    state
        .store()
        .add_log(LogRecord::new(Severity::Info, "ready", "worker"));
    state
        .store()
        .add_metric(MetricPoint::new("queue.depth", 3.0, "worker"));

    let (status, response) = get(app, "/api/v1/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["span_count"], 1);
    assert_eq!(response["log_count"], 1);
    assert_eq!(response["metric_count"], 1);
    assert_eq!(response["capacity"]["max_spans"], 10_000);
    assert_eq!(response["services"], serde_json::json!(["web", "worker"]));
}

#[tokio::test]
async fn test_clear_empties_store() {
    let (app, state) = test_app();
    state.store().add_span(Span::new("t1", "s1", "GET /", "web"));

    let (status, response) = delete(app.clone(), "/api/v1/telemetry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["cleared"], true);

    let (_, stats) = get(app, "/api/v1/stats").await;
    assert_eq!(stats["span_count"], 0);
    assert!(stats["services"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_receiver_status_without_receiver() {
    let (app, _state) = test_app();

    let (status, response) = get(app, "/api/v1/receiver/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["running"], false);
    assert_eq!(response["spans_received"], 0);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _state) = test_app();

    let (status, _) = get(app, "/api/v1/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
