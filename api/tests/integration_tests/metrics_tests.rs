//! Integration tests for metric querying.
//!
//! Tests cover:
//! - Recent metric points, newest first
//! - Filtering by service and metric name
//! - Kind, unit and attributes in responses

use axum::http::StatusCode;
use shared::models::{MetricKind, MetricPoint};

use super::common::{get, test_app};

fn seed(state: &api::AppState) {
    let store = state.store();
    store.add_metric(
        MetricPoint::new("http.server.duration", 12.5, "api")
            .with_unit("ms")
            .with_kind(MetricKind::Histogram)
            .with_attribute("http.route", "/orders"),
    );
    store.add_metric(
        MetricPoint::new("process.cpu.utilization", 0.42, "api").with_kind(MetricKind::Gauge),
    );
    store.add_metric(
        MetricPoint::new("jobs.processed", 17.0, "worker").with_kind(MetricKind::Sum),
    );
}

#[tokio::test]
async fn test_recent_metrics_newest_first() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 3);
    assert_eq!(response["metrics"][0]["name"], "jobs.processed");
    assert_eq!(response["metrics"][0]["kind"], "sum");
}

#[tokio::test]
async fn test_metrics_filter_by_service() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/metrics?service=api").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 2);
    assert_eq!(response["filters"]["service"], "api");
}

#[tokio::test]
async fn test_metrics_filter_by_name() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/metrics?metric_name=http.server.duration").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 1);
    let point = &response["metrics"][0];
    assert_eq!(point["value"], 12.5);
    assert_eq!(point["unit"], "ms");
    assert_eq!(point["kind"], "histogram");
    assert_eq!(point["attributes"]["http.route"], "/orders");
    assert_eq!(response["filters"]["metric_name"], "http.server.duration");
}

#[tokio::test]
async fn test_metrics_unknown_name_is_empty() {
    let (app, state) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/v1/metrics?metric_name=nope").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 0);
}
