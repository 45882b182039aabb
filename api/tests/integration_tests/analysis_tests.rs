//! Integration tests for error aggregation and incident analysis.
//!
//! Tests cover:
//! - Error spans and logs within a window
//! - Incident reports: summary, slow operations, recommendations
//! - Per-service health classification
//! - Code location aggregation

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use shared::models::{CodeLocation, LogRecord, Severity, Span, SpanStatus};

use super::common::{get, test_app};

fn checkout_location() -> CodeLocation {
    CodeLocation {
        filepath: Some("src/checkout.rs".to_string()),
        function: Some("charge_card".to_string()),
        lineno: Some(88),
        namespace: Some("shop::checkout".to_string()),
    }
}

/// Two services: `checkout` fails half its spans, `catalog` is clean but slow.
fn seed_incident(state: &api::AppState) {
    let store = state.store();
    let start = Utc::now() - Duration::minutes(2);

    store.add_span(
        Span::new("t1", "s1", "POST /checkout", "checkout")
            .with_status(SpanStatus::Error)
            .with_timing(start, 40)
            .with_code_location(checkout_location()),
    );
    store.add_span(Span::new("t1", "s2", "POST /checkout", "checkout").with_timing(start, 30));
    store.add_span(
        Span::new("t2", "s3", "GET /catalog", "catalog").with_timing(start, 2_500),
    );
    store.add_span(Span::new("t2", "s4", "GET /catalog", "catalog").with_timing(start, 20));
    store.add_log(
        LogRecord::new(Severity::Error, "card declined", "checkout")
            .with_code_location(checkout_location()),
    );
    store.add_log(LogRecord::new(Severity::Info, "catalog warmed", "catalog"));
}

#[tokio::test]
async fn test_errors_endpoint() {
    let (app, state) = test_app();
    seed_incident(&state);

    let (status, response) = get(app, "/api/v1/errors?since_minutes=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["summary"]["total_error_spans"], 1);
    assert_eq!(response["summary"]["total_error_logs"], 1);
    assert_eq!(
        response["summary"]["affected_services"],
        serde_json::json!(["checkout"])
    );
    assert_eq!(response["error_spans"][0]["is_error"], true);
    assert_eq!(response["error_logs"][0]["body"], "card declined");
}

#[tokio::test]
async fn test_errors_outside_window_are_excluded() {
    let (app, state) = test_app();
    state.store().add_span(
        Span::new("t", "old", "stale failure", "legacy")
            .with_status(SpanStatus::Error)
            .with_timing(Utc::now() - Duration::hours(3), 5),
    );

    let (_, response) = get(app, "/api/v1/errors?since_minutes=60").await;

    assert_eq!(response["summary"]["total_error_spans"], 0);
    assert!(response["error_spans"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_incident_report() {
    let (app, state) = test_app();
    seed_incident(&state);

    let (status, report) = get(app, "/api/v1/incident?since_minutes=15").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["analysis_window"]["minutes"], 15);

    let summary = &report["summary"];
    assert_eq!(summary["total_spans"], 4);
    assert_eq!(summary["total_logs"], 2);
    assert_eq!(summary["error_spans"], 1);
    assert_eq!(summary["error_logs"], 1);
    assert_eq!(summary["error_rate_percent"], 25.0);
    assert_eq!(summary["slow_spans_count"], 1);

    assert_eq!(report["errors_by_service"]["checkout"], 2);
    assert_eq!(report["slow_operations"][0]["name"], "GET /catalog");
    assert_eq!(report["slow_operations"][0]["duration_ms"], 2500.0);

    let location = &report["error_code_locations"][0];
    assert_eq!(location["filepath"], "src/checkout.rs");
    assert_eq!(location["count"], 2);

    let recommendations: Vec<&str> = report["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert_eq!(
        recommendations,
        vec![
            "High error rate (25.0%) detected. Investigate failing services.",
            "Found 1 slow operations (>1s). Consider performance optimization.",
            "Service 'checkout' has the most errors (2). Prioritize investigation.",
            "Code location src/checkout.rs:88 in charge_card has the most errors (2). Start debugging there.",
        ]
    );
}

#[tokio::test]
async fn test_incident_report_on_empty_store() {
    let (app, _state) = test_app();

    let (status, report) = get(app, "/api/v1/incident").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["analysis_window"]["minutes"], 30);
    assert_eq!(report["summary"]["total_spans"], 0);
    assert_eq!(report["summary"]["error_rate_percent"], 0.0);
    assert!(report["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_service_health() {
    let (app, state) = test_app();
    seed_incident(&state);

    let (status, health) = get(app.clone(), "/api/v1/services/checkout/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["service"], "checkout");
    assert_eq!(health["analysis_window_minutes"], 30);
    assert_eq!(health["spans"]["total"], 2);
    assert_eq!(health["spans"]["errors"], 1);
    assert_eq!(health["spans"]["error_rate_percent"], 50.0);
    assert_eq!(health["spans"]["avg_duration_ms"], 35.0);
    assert_eq!(health["logs"]["by_severity"]["ERROR"], 1);
    assert_eq!(health["status"], "critical");

    let (_, health) = get(app, "/api/v1/services/catalog/health").await;
    assert_eq!(health["spans"]["errors"], 0);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_service_health_unknown_service() {
    let (app, _state) = test_app();

    let (status, health) = get(app, "/api/v1/services/ghost/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["spans"]["total"], 0);
    assert_eq!(health["metrics_count"], 0);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_services_listing() {
    let (app, state) = test_app();
    seed_incident(&state);

    let (status, response) = get(app, "/api/v1/services").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 2);
    assert_eq!(response["services"], serde_json::json!(["catalog", "checkout"]));
}

#[tokio::test]
async fn test_code_locations() {
    let (app, state) = test_app();
    seed_incident(&state);
    state.store().add_log(
        LogRecord::new(Severity::Info, "listing", "catalog").with_code_location(CodeLocation {
            filepath: Some("src/catalog.rs".to_string()),
            function: Some("list".to_string()),
            lineno: Some(12),
            namespace: None,
        }),
    );

    let (status, response) = get(app.clone(), "/api/v1/code-locations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 2);
    assert_eq!(response["locations"][0]["filepath"], "src/checkout.rs");
    assert_eq!(response["locations"][0]["count"], 2);
    assert_eq!(response["locations"][0]["error_count"], 2);

    let (_, response) = get(app.clone(), "/api/v1/code-locations?filepath=catalog").await;
    assert_eq!(response["count"], 1);
    assert_eq!(response["locations"][0]["function"], "list");
    assert_eq!(response["filters"]["filepath"], "catalog");

    let (_, response) = get(app, "/api/v1/code-locations?errors_only=true").await;
    assert_eq!(response["count"], 1);
    assert_eq!(response["locations"][0]["function"], "charge_card");
}

#[tokio::test]
async fn test_out_of_range_windows_do_not_fail() {
    let (app, state) = test_app();
    seed_incident(&state);

    let (status, response) = get(app.clone(), "/api/v1/errors?since_minutes=1000000000000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["summary"]["total_error_spans"], 1);

    let (status, report) = get(app, &format!("/api/v1/incident?since_minutes={}", i64::MAX)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        report["analysis_window"]["minutes"],
        shared::query::MAX_WINDOW_MINUTES
    );
    assert_eq!(report["summary"]["total_spans"], 4);
}
