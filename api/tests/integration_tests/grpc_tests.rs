//! Integration tests for the OTLP gRPC receiver.
//!
//! These tests start a real receiver on an ephemeral port, export traces,
//! logs and metrics with the generated OTLP clients and read the results
//! back through the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use api::grpc::OtlpReceiver;
use api::{create_router, AppState};
use axum::http::StatusCode;
use shared::otlp::proto;
use shared::otlp::proto::collector::logs::v1::logs_service_client::LogsServiceClient;
use shared::otlp::proto::collector::logs::v1::ExportLogsServiceRequest;
use shared::otlp::proto::collector::metrics::v1::metrics_service_client::MetricsServiceClient;
use shared::otlp::proto::collector::metrics::v1::ExportMetricsServiceRequest;
use shared::otlp::proto::collector::trace::v1::trace_service_client::TraceServiceClient;
use shared::otlp::proto::collector::trace::v1::ExportTraceServiceRequest;
use shared::storage::TelemetryStore;

use super::common::{get, nanos_ago, resource, string_attr};

async fn start_receiver() -> (OtlpReceiver, AppState, String) {
    let store = Arc::new(TelemetryStore::default());
    let mut receiver = OtlpReceiver::new(Arc::clone(&store), 0);
    let addr: SocketAddr = receiver.start().await.unwrap();
    let state = AppState::new(store, receiver.state());
    let endpoint = format!("http://127.0.0.1:{}", addr.port());
    (receiver, state, endpoint)
}

fn trace_request() -> ExportTraceServiceRequest {
    let start = nanos_ago(5);
    ExportTraceServiceRequest {
        resource_spans: vec![proto::trace::v1::ResourceSpans {
            resource: resource("checkout"),
            scope_spans: vec![proto::trace::v1::ScopeSpans {
                spans: vec![
                    proto::trace::v1::Span {
                        trace_id: vec![0xab; 16],
                        span_id: vec![0x01; 8],
                        name: "POST /checkout".to_string(),
                        start_time_unix_nano: start,
                        end_time_unix_nano: start + 1_200_000_000,
                        attributes: vec![
                            string_attr("code.filepath", "src/checkout.rs"),
                            string_attr("code.function", "submit"),
                        ],
                        status: Some(proto::trace::v1::Status {
                            code: 2,
                            message: "card declined".to_string(),
                        }),
                        ..Default::default()
                    },
                    proto::trace::v1::Span {
                        trace_id: vec![0xab; 16],
                        span_id: vec![0x02; 8],
                        parent_span_id: vec![0x01; 8],
                        name: "charge".to_string(),
                        start_time_unix_nano: start,
                        end_time_unix_nano: start + 300_000_000,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

fn logs_request() -> ExportLogsServiceRequest {
    ExportLogsServiceRequest {
        resource_logs: vec![proto::logs::v1::ResourceLogs {
            resource: resource("checkout"),
            scope_logs: vec![proto::logs::v1::ScopeLogs {
                log_records: vec![proto::logs::v1::LogRecord {
                    time_unix_nano: nanos_ago(3),
                    severity_number: 17,
                    body: Some(proto::common::v1::AnyValue {
                        value: Some(proto::common::v1::any_value::Value::StringValue(
                            "payment provider timeout".to_string(),
                        )),
                    }),
                    trace_id: vec![0xab; 16],
                    span_id: vec![0x01; 8],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

fn metrics_request() -> ExportMetricsServiceRequest {
    use proto::metrics::v1::{metric, number_data_point, Gauge, Metric, NumberDataPoint};

    ExportMetricsServiceRequest {
        resource_metrics: vec![proto::metrics::v1::ResourceMetrics {
            resource: resource("checkout"),
            scope_metrics: vec![proto::metrics::v1::ScopeMetrics {
                metrics: vec![Metric {
                    name: "checkout.queue.depth".to_string(),
                    unit: "1".to_string(),
                    data: Some(metric::Data::Gauge(Gauge {
                        data_points: vec![NumberDataPoint {
                            time_unix_nano: nanos_ago(1),
                            value: Some(number_data_point::Value::AsInt(7)),
                            ..Default::default()
                        }],
                    })),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

#[tokio::test]
async fn test_grpc_traces_export_reaches_api() {
    let (mut receiver, state, endpoint) = start_receiver().await;

    let mut client = TraceServiceClient::connect(endpoint).await.unwrap();
    let response = client.export(trace_request()).await.unwrap().into_inner();
    assert!(response.partial_success.is_none());

    let app = create_router(state);
    let trace_id = "ab".repeat(16);
    let (status, trace) = get(app.clone(), &format!("/api/v1/traces/{trace_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(trace["span_count"], 2);
    assert_eq!(trace["error_count"], 1);
    assert_eq!(trace["services"], serde_json::json!(["checkout"]));

    let child = trace["spans"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "charge")
        .unwrap();
    assert_eq!(child["parent_span_id"], "0101010101010101");

    let (_, locations) = get(app, "/api/v1/code-locations?function=submit").await;
    assert_eq!(locations["count"], 1);
    assert_eq!(locations["locations"][0]["filepath"], "src/checkout.rs");

    receiver.stop().await.unwrap();
}

#[tokio::test]
async fn test_grpc_logs_and_metrics_export() {
    let (mut receiver, state, endpoint) = start_receiver().await;

    LogsServiceClient::connect(endpoint.clone())
        .await
        .unwrap()
        .export(logs_request())
        .await
        .unwrap();
    MetricsServiceClient::connect(endpoint)
        .await
        .unwrap()
        .export(metrics_request())
        .await
        .unwrap();

    let app = create_router(state);

    let (_, logs) = get(app.clone(), "/api/v1/logs?errors_only=true").await;
    assert_eq!(logs["count"], 1);
    assert_eq!(logs["logs"][0]["severity"], "ERROR");
    assert_eq!(logs["logs"][0]["body"], "payment provider timeout");
    assert_eq!(logs["logs"][0]["trace_id"], "ab".repeat(16));

    let (_, metrics) = get(app.clone(), "/api/v1/metrics?metric_name=checkout.queue.depth").await;
    assert_eq!(metrics["count"], 1);
    assert_eq!(metrics["metrics"][0]["value"], 7.0);
    assert_eq!(metrics["metrics"][0]["kind"], "gauge");

    let (_, status) = get(app, "/api/v1/receiver/status").await;
    assert_eq!(status["running"], true);
    assert_eq!(status["logs_received"], 1);
    assert_eq!(status["metrics_received"], 1);
    assert_eq!(status["spans_received"], 0);

    receiver.stop().await.unwrap();
}

#[tokio::test]
async fn test_grpc_empty_export_is_accepted() {
    let (mut receiver, state, endpoint) = start_receiver().await;

    let mut client = TraceServiceClient::connect(endpoint).await.unwrap();
    client
        .export(ExportTraceServiceRequest::default())
        .await
        .unwrap();

    assert_eq!(state.store().get_stats().span_count, 0);

    receiver.stop().await.unwrap();
    assert!(!state.receiver_status().running);
}
