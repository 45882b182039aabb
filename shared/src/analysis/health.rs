//! Per-service health summary.

use super::{error_rate_percent, round2};
use crate::models::{LogRecord, Span};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Error rate above which a service is `critical`.
pub const CRITICAL_ERROR_RATE: f64 = 20.0;
/// Error rate above which a service is `degraded`.
pub const DEGRADED_ERROR_RATE: f64 = 5.0;

/// Overall verdict for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No errors of note.
    Healthy,
    /// Error logs present, span error rate acceptable.
    Warning,
    /// Span error rate above 5%.
    Degraded,
    /// Span error rate above 20%.
    Critical,
}

/// Span statistics for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanHealth {
    /// Spans in the window.
    pub total: usize,
    /// Error spans in the window.
    pub errors: usize,
    /// `errors / total * 100`, two decimals.
    pub error_rate_percent: f64,
    /// Mean span duration, two decimals.
    pub avg_duration_ms: f64,
}

/// Log statistics for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogHealth {
    /// Log records in the window.
    pub total: usize,
    /// `ERROR`/`FATAL` records in the window.
    pub errors: usize,
    /// Record counts keyed by severity name.
    pub by_severity: BTreeMap<String, usize>,
}

/// Health of one service over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    /// The service name.
    pub service: String,
    /// Window length in minutes.
    pub analysis_window_minutes: i64,
    /// Span statistics.
    pub spans: SpanHealth,
    /// Log statistics.
    pub logs: LogHealth,
    /// Metric points in the window.
    pub metrics_count: usize,
    /// Overall verdict.
    pub status: HealthStatus,
}

impl ServiceHealth {
    /// Summarises the given entities, all already restricted to `service`
    /// and to the window.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(
        service: impl Into<String>,
        window_minutes: i64,
        spans: &[Arc<Span>],
        logs: &[Arc<LogRecord>],
        metrics_count: usize,
    ) -> Self {
        let span_errors = spans.iter().filter(|s| s.is_error()).count();
        let error_rate = round2(error_rate_percent(spans.len(), span_errors));
        let avg_duration_ms = if spans.is_empty() {
            0.0
        } else {
            round2(spans.iter().map(|s| s.duration_ms()).sum::<f64>() / spans.len() as f64)
        };

        let mut by_severity = BTreeMap::new();
        for log in logs {
            *by_severity.entry(log.severity.clone()).or_insert(0) += 1;
        }
        let log_errors = logs.iter().filter(|l| l.is_error()).count();

        let status = if error_rate > CRITICAL_ERROR_RATE {
            HealthStatus::Critical
        } else if error_rate > DEGRADED_ERROR_RATE {
            HealthStatus::Degraded
        } else if log_errors > 0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        Self {
            service: service.into(),
            analysis_window_minutes: window_minutes,
            spans: SpanHealth {
                total: spans.len(),
                errors: span_errors,
                error_rate_percent: error_rate,
                avg_duration_ms,
            },
            logs: LogHealth {
                total: logs.len(),
                errors: log_errors,
                by_severity,
            },
            metrics_count,
            status,
        }
    }
}
