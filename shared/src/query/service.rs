use super::{
    limit_or, minutes_or, non_blank, DEFAULT_ERROR_LIMIT, DEFAULT_ERROR_WINDOW_MINUTES,
    DEFAULT_INCIDENT_WINDOW_MINUTES, DEFAULT_LOCATION_LIMIT, DEFAULT_LOG_LIMIT,
    DEFAULT_METRIC_LIMIT, DEFAULT_TRACE_LIMIT, HEALTH_WINDOW_MINUTES,
};
use crate::analysis::{
    aggregate_locations, AnalysisWindow, CodeLocationSummary, IncidentReport, ServiceHealth,
};
use crate::models::{LogView, MetricPoint, SpanView, Trace};
use crate::storage::{
    ErrorSummary, LogQuery, MetricQuery, SpanQuery, StoreStats, TelemetryStore,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Filters applied by [`QueryService::recent_traces`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceFilters {
    /// Exact service name.
    pub service: Option<String>,
    /// Only spans with status `ERROR`.
    pub errors_only: bool,
}

/// Result of [`QueryService::recent_traces`].
#[derive(Debug, Clone, Serialize)]
pub struct RecentTraces {
    /// Number of spans returned.
    pub count: usize,
    /// Effective filters.
    pub filters: TraceFilters,
    /// Spans, newest first.
    pub traces: Vec<SpanView>,
}

/// Filters applied by [`QueryService::recent_logs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogFilters {
    /// Exact service name.
    pub service: Option<String>,
    /// Exact severity name.
    pub severity: Option<String>,
    /// Only `ERROR`/`FATAL` records.
    pub errors_only: bool,
}

/// Result of [`QueryService::recent_logs`].
#[derive(Debug, Clone, Serialize)]
pub struct RecentLogs {
    /// Number of records returned.
    pub count: usize,
    /// Effective filters.
    pub filters: LogFilters,
    /// Records, newest first.
    pub logs: Vec<LogView>,
}

/// Filters applied by [`QueryService::recent_metrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricFilters {
    /// Exact service name.
    pub service: Option<String>,
    /// Exact metric name.
    pub metric_name: Option<String>,
}

/// Result of [`QueryService::recent_metrics`].
#[derive(Debug, Clone, Serialize)]
pub struct RecentMetrics {
    /// Number of points returned.
    pub count: usize,
    /// Effective filters.
    pub filters: MetricFilters,
    /// Points, newest first.
    pub metrics: Vec<Arc<MetricPoint>>,
}

/// Result of [`QueryService::trace_by_id`].
#[derive(Debug, Clone, Serialize)]
pub struct TraceDetail {
    /// The requested trace id.
    pub trace_id: String,
    /// Number of retained spans.
    pub span_count: usize,
    /// Participating services, sorted.
    pub services: Vec<String>,
    /// Extent of the trace, absent when no span is retained.
    pub duration_ms: Option<f64>,
    /// Spans with status `ERROR`.
    pub error_count: usize,
    /// Spans ordered by start time ascending.
    pub spans: Vec<SpanView>,
}

/// Result of [`QueryService::errors`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorsResult {
    /// Counts, affected services and window.
    pub summary: ErrorSummary,
    /// Error spans, newest first.
    pub error_spans: Vec<SpanView>,
    /// Error log records, newest first.
    pub error_logs: Vec<LogView>,
}

/// Filters applied by [`QueryService::code_locations`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationFilters {
    /// Substring of the source file path.
    pub filepath: Option<String>,
    /// Substring of the function name.
    pub function: Option<String>,
    /// Exact service name.
    pub service: Option<String>,
    /// Only erroneous spans and logs.
    pub errors_only: bool,
}

/// Result of [`QueryService::code_locations`].
#[derive(Debug, Clone, Serialize)]
pub struct CodeLocations {
    /// Number of locations returned.
    pub count: usize,
    /// Effective filters.
    pub filters: LocationFilters,
    /// Locations, busiest first.
    pub locations: Vec<CodeLocationSummary>,
}

/// Query surface over a shared [`TelemetryStore`].
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<TelemetryStore>,
}

impl QueryService {
    /// Creates a query service reading from `store`.
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    /// Most recent spans, optionally restricted to a service and to errors.
    #[must_use]
    pub fn recent_traces(
        &self,
        limit: Option<usize>,
        service: Option<&str>,
        errors_only: bool,
    ) -> RecentTraces {
        let service = non_blank(service);
        let mut query = SpanQuery::new();
        if let Some(service) = service {
            query = query.with_service(service);
        }
        if errors_only {
            query = query.errors_only();
        }

        let traces: Vec<SpanView> = self
            .store
            .get_recent_spans(limit_or(limit, DEFAULT_TRACE_LIMIT), &query)
            .into_iter()
            .map(SpanView::from)
            .collect();

        RecentTraces {
            count: traces.len(),
            filters: TraceFilters {
                service: service.map(str::to_string),
                errors_only,
            },
            traces,
        }
    }

    /// Most recent log records, optionally filtered.
    #[must_use]
    pub fn recent_logs(
        &self,
        limit: Option<usize>,
        service: Option<&str>,
        severity: Option<&str>,
        errors_only: bool,
    ) -> RecentLogs {
        let service = non_blank(service);
        let severity = non_blank(severity);
        let mut query = LogQuery::new();
        if let Some(service) = service {
            query = query.with_service(service);
        }
        if let Some(severity) = severity {
            query = query.with_severity(severity);
        }
        if errors_only {
            query = query.errors_only();
        }

        let logs: Vec<LogView> = self
            .store
            .get_recent_logs(limit_or(limit, DEFAULT_LOG_LIMIT), &query)
            .into_iter()
            .map(LogView::from)
            .collect();

        RecentLogs {
            count: logs.len(),
            filters: LogFilters {
                service: service.map(str::to_string),
                severity: severity.map(str::to_string),
                errors_only,
            },
            logs,
        }
    }

    /// Most recent metric points, optionally filtered.
    #[must_use]
    pub fn recent_metrics(
        &self,
        limit: Option<usize>,
        service: Option<&str>,
        metric_name: Option<&str>,
    ) -> RecentMetrics {
        let service = non_blank(service);
        let metric_name = non_blank(metric_name);
        let mut query = MetricQuery::new();
        if let Some(service) = service {
            query = query.with_service(service);
        }
        if let Some(name) = metric_name {
            query = query.with_name(name);
        }

        let metrics = self
            .store
            .get_recent_metrics(limit_or(limit, DEFAULT_METRIC_LIMIT), &query);

        RecentMetrics {
            count: metrics.len(),
            filters: MetricFilters {
                service: service.map(str::to_string),
                metric_name: metric_name.map(str::to_string),
            },
            metrics,
        }
    }

    /// Every retained span of one trace. Ids are matched case-insensitively.
    #[must_use]
    pub fn trace_by_id(&self, trace_id: &str) -> TraceDetail {
        let trace_id = trace_id.trim().to_ascii_lowercase();
        let trace = Trace::new(trace_id.clone(), self.store.get_trace(&trace_id));

        TraceDetail {
            span_count: trace.spans.len(),
            services: trace.services(),
            duration_ms: trace.duration_ms(),
            error_count: trace.error_count(),
            spans: trace.spans.into_iter().map(SpanView::from).collect(),
            trace_id,
        }
    }

    /// Error spans and error logs in the trailing window.
    #[must_use]
    pub fn errors(&self, limit: Option<usize>, since_minutes: Option<i64>) -> ErrorsResult {
        let report = self.store.get_errors(
            limit_or(limit, DEFAULT_ERROR_LIMIT),
            minutes_or(since_minutes, DEFAULT_ERROR_WINDOW_MINUTES),
        );

        ErrorsResult {
            summary: report.summary,
            error_spans: report.error_spans.into_iter().map(SpanView::from).collect(),
            error_logs: report.error_logs.into_iter().map(LogView::from).collect(),
        }
    }

    /// Incident report for the trailing window.
    #[must_use]
    pub fn analyze_incident(&self, since_minutes: Option<i64>) -> IncidentReport {
        self.analyze_incident_at(since_minutes, Utc::now())
    }

    /// Like [`QueryService::analyze_incident`] with an explicit window end.
    #[must_use]
    pub fn analyze_incident_at(
        &self,
        since_minutes: Option<i64>,
        now: DateTime<Utc>,
    ) -> IncidentReport {
        let minutes = minutes_or(since_minutes, DEFAULT_INCIDENT_WINDOW_MINUTES);
        let errors = self.store.get_errors_at(usize::MAX, minutes, now);
        let since = errors.summary.time_range.since;

        let spans = self
            .store
            .get_recent_spans(usize::MAX, &SpanQuery::new().with_since(since));
        let logs = self
            .store
            .get_recent_logs(usize::MAX, &LogQuery::new().with_since(since));

        let report = IncidentReport::build(
            AnalysisWindow::new(errors.summary.time_range, minutes),
            &spans,
            &logs,
            &errors,
        );
        tracing::debug!(
            minutes,
            spans = spans.len(),
            logs = logs.len(),
            error_rate = report.summary.error_rate_percent,
            "incident analysed"
        );
        report
    }

    /// Health summary of one service over the last 30 minutes.
    #[must_use]
    pub fn service_health(&self, service: &str) -> ServiceHealth {
        self.service_health_at(service, Utc::now())
    }

    /// Like [`QueryService::service_health`] with an explicit window end.
    #[must_use]
    pub fn service_health_at(&self, service: &str, now: DateTime<Utc>) -> ServiceHealth {
        let since = now - Duration::minutes(HEALTH_WINDOW_MINUTES);

        let spans = self.store.get_recent_spans(
            usize::MAX,
            &SpanQuery::new().with_service(service).with_since(since),
        );
        let logs = self.store.get_recent_logs(
            usize::MAX,
            &LogQuery::new().with_service(service).with_since(since),
        );
        let metrics_count = self
            .store
            .get_recent_metrics(
                usize::MAX,
                &MetricQuery::new().with_service(service).with_since(since),
            )
            .len();

        ServiceHealth::build(service, HEALTH_WINDOW_MINUTES, &spans, &logs, metrics_count)
    }

    /// Spans and logs grouped by code location, busiest first.
    #[must_use]
    pub fn code_locations(
        &self,
        filepath: Option<&str>,
        function: Option<&str>,
        service: Option<&str>,
        errors_only: bool,
        limit: Option<usize>,
    ) -> CodeLocations {
        let filters = LocationFilters {
            filepath: non_blank(filepath).map(str::to_string),
            function: non_blank(function).map(str::to_string),
            service: non_blank(service).map(str::to_string),
            errors_only,
        };

        let mut span_query = SpanQuery::new();
        let mut log_query = LogQuery::new();
        if let Some(ref filepath) = filters.filepath {
            span_query = span_query.with_code_filepath(filepath.as_str());
            log_query = log_query.with_code_filepath(filepath.as_str());
        }
        if let Some(ref function) = filters.function {
            span_query = span_query.with_code_function(function.as_str());
            log_query = log_query.with_code_function(function.as_str());
        }
        if let Some(ref service) = filters.service {
            span_query = span_query.with_service(service.as_str());
            log_query = log_query.with_service(service.as_str());
        }
        if errors_only {
            span_query = span_query.errors_only();
            log_query = log_query.errors_only();
        }

        let spans = self.store.get_recent_spans(usize::MAX, &span_query);
        let logs = self.store.get_recent_logs(usize::MAX, &log_query);
        let locations =
            aggregate_locations(&spans, &logs, limit_or(limit, DEFAULT_LOCATION_LIMIT));

        CodeLocations {
            count: locations.len(),
            filters,
            locations,
        }
    }

    /// Store occupancy, capacities and services.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.store.get_stats()
    }

    /// Every service seen since the last clear, sorted.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        self.store.services()
    }

    /// Drops all telemetry and the service registry.
    pub fn clear(&self) {
        self.store.clear();
    }
}
