//! Integration tests for directory ingestion.
//!
//! Tests cover:
//! - Backfilling exports present before the watcher starts
//! - Picking up lines appended while running
//! - Files of every signal type in one directory
//! - Malformed lines being skipped

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use api::grpc::ReceiverState;
use api::watcher::TelemetryWatcher;
use api::{create_router, AppState};
use shared::storage::TelemetryStore;

use super::common::get;

const TRACE_ID: &str = "5b8efff798038103d269b633813fc60c";

const SPAN_LINE: &str = r#"{"resourceSpans":[{"resource":{"attributes":[{"key":"service.name","value":{"stringValue":"orders"}}]},"scopeSpans":[{"spans":[{"traceId":"5B8EFFF798038103D269B633813FC60C","spanId":"EEE19B7EC3C1B174","name":"GET /orders","startTimeUnixNano":"1700000000000000000","endTimeUnixNano":"1700000000250000000","status":{"code":2}}]}]}]}"#;
const CHILD_SPAN_LINE: &str = r#"{"resourceSpans":[{"resource":{"attributes":[{"key":"service.name","value":{"stringValue":"inventory"}}]},"scopeSpans":[{"spans":[{"traceId":"5B8EFFF798038103D269B633813FC60C","spanId":"0102030405060708","parentSpanId":"EEE19B7EC3C1B174","name":"reserve","startTimeUnixNano":"1700000000010000000","endTimeUnixNano":"1700000000090000000"}]}]}]}"#;
const LOG_LINE: &str = r#"{"resourceLogs":[{"resource":{"attributes":[{"key":"service.name","value":{"stringValue":"orders"}}]},"scopeLogs":[{"logRecords":[{"timeUnixNano":"1700000000000000000","severityNumber":17,"body":{"stringValue":"db timeout"}}]}]}]}"#;
const METRIC_LINE: &str = r#"{"resourceMetrics":[{"resource":{"attributes":[{"key":"service.name","value":{"stringValue":"orders"}}]},"scopeMetrics":[{"metrics":[{"name":"orders.pending","unit":"1","gauge":{"dataPoints":[{"asDouble":4.5,"timeUnixNano":"1700000000000000000"}]}}]}]}]}"#;

const POLL: Duration = Duration::from_millis(20);

fn append(path: &Path, line: &str) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(format!("{line}\n").as_bytes()).unwrap();
}

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..150 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

fn state_for(store: Arc<TelemetryStore>) -> AppState {
    AppState::new(store, Arc::new(ReceiverState::default()))
}

#[tokio::test]
async fn test_backfill_then_tail() {
    let dir = tempfile::tempdir().unwrap();
    append(&dir.path().join("traces.jsonl"), SPAN_LINE);
    append(&dir.path().join("logs.jsonl"), LOG_LINE);

    let store = Arc::new(TelemetryStore::default());
    let mut watcher = TelemetryWatcher::start(Arc::clone(&store), dir.path(), POLL)
        .await
        .unwrap();

    assert_eq!(watcher.backfill_summary().files, 2);
    assert_eq!(store.get_stats().span_count, 1);
    assert_eq!(store.get_stats().log_count, 1);

    append(&dir.path().join("traces.jsonl"), CHILD_SPAN_LINE);
    assert!(wait_for(|| store.get_stats().span_count == 2).await);

    let app = create_router(state_for(Arc::clone(&store)));
    let (_, trace) = get(app, &format!("/api/v1/traces/{TRACE_ID}")).await;
    assert_eq!(trace["span_count"], 2);
    assert_eq!(trace["duration_ms"], 250.0);
    assert_eq!(trace["services"], serde_json::json!(["inventory", "orders"]));

    watcher.stop().await;
    assert!(!watcher.is_running());
}

#[tokio::test]
async fn test_new_files_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(TelemetryStore::default());
    let mut watcher = TelemetryWatcher::start(Arc::clone(&store), dir.path(), POLL)
        .await
        .unwrap();
    assert_eq!(watcher.backfill_summary().files, 0);

    append(&dir.path().join("metrics.jsonl"), METRIC_LINE);
    append(&dir.path().join("ignored.txt"), METRIC_LINE);
    assert!(wait_for(|| store.get_stats().metric_count == 1).await);

    let app = create_router(state_for(Arc::clone(&store)));
    let (_, metrics) = get(app, "/api/v1/metrics?service=orders").await;
    assert_eq!(metrics["count"], 1);
    assert_eq!(metrics["metrics"][0]["name"], "orders.pending");
    assert_eq!(metrics["metrics"][0]["value"], 4.5);

    tokio::time::sleep(POLL * 5).await;
    assert_eq!(store.get_stats().metric_count, 1);

    watcher.stop().await;
}

#[tokio::test]
async fn test_malformed_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.jsonl");
    append(&path, "{not json");
    append(&path, LOG_LINE);
    append(&path, "");
    append(&path, SPAN_LINE);

    let store = Arc::new(TelemetryStore::default());
    let mut watcher = TelemetryWatcher::start(Arc::clone(&store), dir.path(), POLL)
        .await
        .unwrap();

    let summary = watcher.backfill_summary();
    assert_eq!(summary.totals.logs, 1);
    assert_eq!(summary.totals.spans, 1);
    assert_eq!(summary.totals.skipped_lines, 1);

    let app = create_router(state_for(Arc::clone(&store)));
    let (_, logs) = get(app, "/api/v1/logs?errors_only=true").await;
    assert_eq!(logs["count"], 1);
    assert_eq!(logs["logs"][0]["body"], "db timeout");

    watcher.stop().await;
}

#[tokio::test]
async fn test_watcher_creates_missing_directory() {
    let parent = tempfile::tempdir().unwrap();
    let dir = parent.path().join("exports").join("otel");

    let store = Arc::new(TelemetryStore::default());
    let mut watcher = TelemetryWatcher::start(Arc::clone(&store), &dir, POLL)
        .await
        .unwrap();

    assert!(dir.is_dir());
    assert!(watcher.is_running());

    append(&dir.join("logs.json"), LOG_LINE);
    assert!(wait_for(|| store.get_stats().log_count == 1).await);

    watcher.stop().await;
}
