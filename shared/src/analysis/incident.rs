//! Incident report over a trailing window.

use super::locations::{aggregate_locations, CodeLocationSummary};
use super::{error_rate_percent, round2};
use crate::models::{CodeLocation, LogRecord, LogView, Span, SpanView};
use crate::storage::{ErrorReport, TimeRange};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Spans slower than this are reported as slow operations.
pub const SLOW_SPAN_THRESHOLD_MS: f64 = 1000.0;
/// Error rate that triggers the high-error-rate recommendation.
pub const HIGH_ERROR_RATE: f64 = 10.0;
/// Maximum slow operations in a report.
pub const MAX_SLOW_OPERATIONS: usize = 10;
/// Maximum recent error spans and logs in a report, each.
pub const MAX_RECENT_ERRORS: usize = 10;
/// Maximum error code locations in a report.
pub const MAX_ERROR_LOCATIONS: usize = 20;

/// Window an incident report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    /// Window start.
    pub since: DateTime<Utc>,
    /// Window end.
    pub until: DateTime<Utc>,
    /// Window length.
    pub minutes: i64,
}

impl AnalysisWindow {
    /// Window from a [`TimeRange`] and its length.
    #[must_use]
    pub fn new(range: TimeRange, minutes: i64) -> Self {
        Self {
            since: range.since,
            until: range.until,
            minutes,
        }
    }
}

/// Headline numbers of an incident report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentSummary {
    /// Spans in the window.
    pub total_spans: usize,
    /// Log records in the window.
    pub total_logs: usize,
    /// Error spans in the window.
    pub error_spans: usize,
    /// `ERROR`/`FATAL` log records in the window.
    pub error_logs: usize,
    /// Error spans over all spans, two decimals.
    pub error_rate_percent: f64,
    /// Spans above the slow threshold, uncapped.
    pub slow_spans_count: usize,
    /// Services with at least one error, sorted.
    pub affected_services: Vec<String>,
}

/// A span that took longer than [`SLOW_SPAN_THRESHOLD_MS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowOperation {
    /// Span name.
    pub name: String,
    /// Owning service.
    pub service: String,
    /// Span duration.
    pub duration_ms: f64,
    /// Trace the span belongs to.
    pub trace_id: String,
}

/// Most recent error spans and logs, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecentErrors {
    /// Error spans.
    pub spans: Vec<SpanView>,
    /// Error log records.
    pub logs: Vec<LogView>,
}

/// Aggregated picture of what went wrong in a window.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentReport {
    /// Covered window.
    pub analysis_window: AnalysisWindow,
    /// Headline numbers.
    pub summary: IncidentSummary,
    /// Error spans plus error logs per service.
    pub errors_by_service: BTreeMap<String, usize>,
    /// Code locations producing the most errors.
    pub error_code_locations: Vec<CodeLocationSummary>,
    /// Latest errors.
    pub recent_errors: RecentErrors,
    /// Slowest spans, descending.
    pub slow_operations: Vec<SlowOperation>,
    /// Human-readable next steps.
    pub recommendations: Vec<String>,
}

impl IncidentReport {
    /// Builds a report from every span and log in the window and the error
    /// aggregate for the same window.
    #[must_use]
    pub fn build(
        window: AnalysisWindow,
        spans: &[Arc<Span>],
        logs: &[Arc<LogRecord>],
        errors: &ErrorReport,
    ) -> Self {
        let error_rate = error_rate_percent(spans.len(), errors.error_spans.len());

        let mut errors_by_service: BTreeMap<String, usize> = BTreeMap::new();
        for service in errors
            .error_spans
            .iter()
            .map(|s| &s.service)
            .chain(errors.error_logs.iter().map(|l| &l.service))
        {
            *errors_by_service.entry(service.clone()).or_insert(0) += 1;
        }

        let slow_operations = slow_operations(spans);
        let slow_spans_count = spans
            .iter()
            .filter(|s| s.duration_ms() > SLOW_SPAN_THRESHOLD_MS)
            .count();

        let error_code_locations =
            aggregate_locations(&errors.error_spans, &errors.error_logs, MAX_ERROR_LOCATIONS);

        let recommendations = recommendations(
            error_rate,
            slow_spans_count,
            &errors_by_service,
            error_code_locations.first(),
        );

        Self {
            analysis_window: window,
            summary: IncidentSummary {
                total_spans: spans.len(),
                total_logs: logs.len(),
                error_spans: errors.summary.total_error_spans,
                error_logs: errors.summary.total_error_logs,
                error_rate_percent: round2(error_rate),
                slow_spans_count,
                affected_services: errors.summary.affected_services.clone(),
            },
            errors_by_service,
            error_code_locations,
            recent_errors: RecentErrors {
                spans: errors
                    .error_spans
                    .iter()
                    .take(MAX_RECENT_ERRORS)
                    .cloned()
                    .map(SpanView::from)
                    .collect(),
                logs: errors
                    .error_logs
                    .iter()
                    .take(MAX_RECENT_ERRORS)
                    .cloned()
                    .map(LogView::from)
                    .collect(),
            },
            slow_operations,
            recommendations,
        }
    }
}

fn slow_operations(spans: &[Arc<Span>]) -> Vec<SlowOperation> {
    let mut slow: Vec<SlowOperation> = spans
        .iter()
        .filter(|s| s.duration_ms() > SLOW_SPAN_THRESHOLD_MS)
        .map(|s| SlowOperation {
            name: s.name.clone(),
            service: s.service.clone(),
            duration_ms: s.duration_ms(),
            trace_id: s.trace_id.clone(),
        })
        .collect();
    slow.sort_by(|a, b| b.duration_ms.total_cmp(&a.duration_ms));
    slow.truncate(MAX_SLOW_OPERATIONS);
    slow
}

fn recommendations(
    error_rate: f64,
    slow_count: usize,
    errors_by_service: &BTreeMap<String, usize>,
    top_location: Option<&CodeLocationSummary>,
) -> Vec<String> {
    let mut out = Vec::new();

    if error_rate > HIGH_ERROR_RATE {
        out.push(format!(
            "High error rate ({error_rate:.1}%) detected. Investigate failing services."
        ));
    }

    if slow_count > 0 {
        out.push(format!(
            "Found {slow_count} slow operations (>1s). Consider performance optimization."
        ));
    }

    // BTreeMap iterates in key order, so the first maximum is the
    // lexicographically smallest service.
    let worst = errors_by_service
        .iter()
        .fold(None::<(&String, usize)>, |best, (svc, &n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((svc, n)),
        });
    if let Some((service, count)) = worst {
        out.push(format!(
            "Service '{service}' has the most errors ({count}). Prioritize investigation."
        ));
    }

    if let Some(location) = top_location {
        let code = CodeLocation {
            filepath: location.filepath.clone(),
            function: location.function.clone(),
            lineno: location.lineno,
            namespace: location.namespace.clone(),
        };
        out.push(format!(
            "Code location {code} has the most errors ({}). Start debugging there.",
            location.count
        ));
    }

    out
}
