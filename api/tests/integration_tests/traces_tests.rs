//! Integration tests for trace querying.
//!
//! Tests cover:
//! - Recent spans, newest first, with service and error filters
//! - Reassembling a complete trace by id
//! - Limits and malformed parameters
//! - Unknown trace ids

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use shared::models::{Span, SpanStatus};

use super::common::{get, test_app};

const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

#[tokio::test]
async fn test_get_trace_by_id() {
    let (app, state) = test_app();
    let start = Utc::now() - Duration::seconds(10);

    state.store().add_span(
        Span::new(TRACE_ID, "aaaa000000000001", "HTTP GET /users", "api-gateway")
            .with_timing(start, 150),
    );
    state.store().add_span(
        Span::new(TRACE_ID, "aaaa000000000002", "SELECT users", "user-service")
            .with_parent("aaaa000000000001")
            .with_timing(start + Duration::milliseconds(20), 80)
            .with_attribute("db.system", "postgresql"),
    );
    state
        .store()
        .add_span(Span::new("ffff", "bbbb", "unrelated", "other"));

    let (status, response) = get(app, &format!("/api/v1/traces/{TRACE_ID}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["trace_id"], TRACE_ID);
    assert_eq!(response["span_count"], 2);
    assert_eq!(response["error_count"], 0);
    assert_eq!(response["duration_ms"], 150.0);
    assert_eq!(
        response["services"],
        serde_json::json!(["api-gateway", "user-service"])
    );

    let spans = response["spans"].as_array().unwrap();
    let root = spans
        .iter()
        .find(|s| s["span_id"] == "aaaa000000000001")
        .unwrap();
    assert!(root["parent_span_id"].is_null());
    assert_eq!(root["duration_ms"], 150.0);

    let child = spans
        .iter()
        .find(|s| s["span_id"] == "aaaa000000000002")
        .unwrap();
    assert_eq!(child["parent_span_id"], "aaaa000000000001");
    assert_eq!(child["attributes"]["db.system"], "postgresql");
}

#[tokio::test]
async fn test_get_trace_by_id_is_case_insensitive() {
    let (app, state) = test_app();
    state
        .store()
        .add_span(Span::new(TRACE_ID, "s1", "op", "svc"));

    let (status, response) = get(app, &format!("/api/v1/traces/{}", TRACE_ID.to_uppercase())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["span_count"], 1);
}

#[tokio::test]
async fn test_get_unknown_trace_is_empty() {
    let (app, _state) = test_app();

    let (status, response) = get(app, "/api/v1/traces/0000000000000000").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["span_count"], 0);
    assert!(response["spans"].as_array().unwrap().is_empty());
    assert!(response["duration_ms"].is_null());
}

#[tokio::test]
async fn test_recent_traces_newest_first() {
    let (app, state) = test_app();
    for i in 0..5 {
        state
            .store()
            .add_span(Span::new("t", format!("s{i}"), format!("op-{i}"), "svc"));
    }

    let (status, response) = get(app, "/api/v1/traces?limit=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 3);
    let names: Vec<&str> = response["traces"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["op-4", "op-3", "op-2"]);
}

#[tokio::test]
async fn test_recent_traces_filter_by_service_and_errors() {
    let (app, state) = test_app();
    state
        .store()
        .add_span(Span::new("t1", "s1", "charge", "payments").with_status(SpanStatus::Error));
    state
        .store()
        .add_span(Span::new("t1", "s2", "refund", "payments").with_status(SpanStatus::Ok));
    state
        .store()
        .add_span(Span::new("t2", "s3", "render", "frontend").with_status(SpanStatus::Error));

    let (status, response) = get(
        app.clone(),
        "/api/v1/traces?service=payments&errors_only=true",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 1);
    assert_eq!(response["traces"][0]["name"], "charge");
    assert_eq!(response["traces"][0]["status"], "ERROR");
    assert_eq!(response["filters"]["service"], "payments");

    let (_, response) = get(app, "/api/v1/traces?service=payments").await;
    assert_eq!(response["count"], 2);
}

#[tokio::test]
async fn test_recent_traces_malformed_limit_uses_default() {
    let (app, state) = test_app();
    for i in 0..25 {
        state
            .store()
            .add_span(Span::new("t", format!("s{i}"), "op", "svc"));
    }

    let (status, response) = get(app, "/api/v1/traces?limit=lots").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 20);
}
