//! Read operations over the telemetry store.
//!
//! [`QueryService`] is what every caller (HTTP routes, CLI) talks to. Its
//! inputs are lenient: a zero or absent limit and a non-positive window fall
//! back to the documented default, and blank string filters are ignored.
//! Unknown trace ids or services produce empty results, never errors.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shared::models::{Span, SpanStatus};
//! use shared::query::QueryService;
//! use shared::storage::TelemetryStore;
//!
//! let store = Arc::new(TelemetryStore::default());
//! store.add_span(Span::new("t1", "s1", "GET /orders", "orders").with_status(SpanStatus::Error));
//!
//! let queries = QueryService::new(store);
//! let traces = queries.recent_traces(None, Some("orders"), true);
//! assert_eq!(traces.count, 1);
//! ```

mod service;

pub use service::{
    CodeLocations, ErrorsResult, LocationFilters, LogFilters, MetricFilters, QueryService,
    RecentLogs, RecentMetrics, RecentTraces, TraceDetail, TraceFilters,
};

/// Default number of spans returned by `recent_traces`.
pub const DEFAULT_TRACE_LIMIT: usize = 20;
/// Default number of records returned by `recent_logs`.
pub const DEFAULT_LOG_LIMIT: usize = 30;
/// Default number of points returned by `recent_metrics`.
pub const DEFAULT_METRIC_LIMIT: usize = 50;
/// Default number of spans and of logs returned by `errors`.
pub const DEFAULT_ERROR_LIMIT: usize = 30;
/// Default look-back of `errors`, in minutes.
pub const DEFAULT_ERROR_WINDOW_MINUTES: i64 = 60;
/// Default look-back of `analyze_incident`, in minutes.
pub const DEFAULT_INCIDENT_WINDOW_MINUTES: i64 = 30;
/// Look-back of `service_health`, in minutes.
pub const HEALTH_WINDOW_MINUTES: i64 = 30;
/// Default number of entries returned by `code_locations`.
pub const DEFAULT_LOCATION_LIMIT: usize = 20;
/// Longest accepted look-back, in minutes (ten years). Larger windows are
/// clamped to it.
pub const MAX_WINDOW_MINUTES: i64 = 10 * 365 * 24 * 60;

fn limit_or(limit: Option<usize>, default: usize) -> usize {
    match limit {
        Some(n) if n > 0 => n,
        _ => default,
    }
}

fn minutes_or(minutes: Option<i64>, default: i64) -> i64 {
    match minutes {
        Some(m) if m > 0 => m.min(MAX_WINDOW_MINUTES),
        _ => default,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
