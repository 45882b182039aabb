//! Trace and span data models.
//!
//! Spans arrive from both the OTLP JSON export files and the gRPC receiver
//! and are normalised into the [`Span`] defined here.

use super::attribute::{AttributeValue, Attributes};
use super::code::CodeLocation;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Status code for a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanStatus {
    /// No status was set by the instrumentation.
    #[default]
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    Error,
}

impl SpanStatus {
    /// Maps an OTLP status code: `0` unset, `1` ok, `2` error.
    ///
    /// Unknown codes are treated as unset.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Ok,
            2 => Self::Error,
            _ => Self::Unset,
        }
    }

    /// Parses an OTLP status enum name such as `STATUS_CODE_ERROR` or `error`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        match upper.strip_prefix("STATUS_CODE_").unwrap_or(&upper) {
            "OK" => Self::Ok,
            "ERROR" => Self::Error,
            other => other
                .parse::<i64>()
                .map_or(Self::Unset, Self::from_code),
        }
    }
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "UNSET"),
            Self::Ok => write!(f, "OK"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// An event within a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    /// The name of the event.
    pub name: String,
    /// Timestamp when the event occurred.
    pub timestamp: DateTime<Utc>,
}

/// A span representing a unit of work in a distributed trace.
///
/// # Example
///
/// ```
/// use shared::models::{Span, SpanStatus};
///
/// let span = Span::new("4bf92f3577b34da6", "00f067aa0ba902b7", "GET /orders", "order-service")
///     .with_status(SpanStatus::Error)
///     .with_attribute("http.method", "GET")
///     .with_attribute("http.status_code", 500);
///
/// assert!(span.is_error());
/// assert!(span.is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Trace identifier, lowercase hex.
    pub trace_id: String,

    /// Span identifier, lowercase hex.
    pub span_id: String,

    /// The parent span ID (None for root spans).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// The name/operation of this span.
    pub name: String,

    /// The service that generated this span.
    pub service: String,

    /// Timestamp when the span started.
    pub start_time: DateTime<Utc>,

    /// Timestamp when the span ended.
    pub end_time: DateTime<Utc>,

    /// The status of the span.
    #[serde(default)]
    pub status: SpanStatus,

    /// Span attributes.
    #[serde(default)]
    pub attributes: Attributes,

    /// Events that occurred during the span.
    #[serde(default)]
    pub events: Vec<SpanEvent>,

    /// Source location recorded by the instrumentation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeLocation>,
}

impl Span {
    /// Creates a new span with the current time as both start and end.
    #[must_use]
    pub fn new(
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
        name: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: None,
            name: name.into(),
            service: service.into(),
            start_time: now,
            end_time: now,
            status: SpanStatus::default(),
            attributes: Attributes::new(),
            events: Vec::new(),
            code: None,
        }
    }

    /// Sets the parent span ID.
    #[must_use]
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    /// Sets the span status.
    #[must_use]
    pub fn with_status(mut self, status: SpanStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the start time.
    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Sets the end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = end_time;
        self
    }

    /// Sets start and end from a start time and a duration in milliseconds.
    #[must_use]
    pub fn with_timing(mut self, start_time: DateTime<Utc>, duration_ms: i64) -> Self {
        self.start_time = start_time;
        self.end_time = start_time + Duration::milliseconds(duration_ms);
        self
    }

    /// Adds an attribute to the span.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds an event to the span.
    #[must_use]
    pub fn with_event(mut self, name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        self.events.push(SpanEvent {
            name: name.into(),
            timestamp,
        });
        self
    }

    /// Sets the code location.
    #[must_use]
    pub fn with_code_location(mut self, code: CodeLocation) -> Self {
        self.code = Some(code);
        self
    }

    /// Returns the duration of the span. Negative if end precedes start.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Returns the duration in fractional milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_ms(&self) -> f64 {
        let duration = self.duration();
        match duration.num_nanoseconds() {
            Some(nanos) => nanos as f64 / 1_000_000.0,
            None => duration.num_milliseconds() as f64,
        }
    }

    /// Returns true if the span status is `ERROR`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == SpanStatus::Error
    }

    /// Returns true if this is a root span (no parent).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

/// All retained spans sharing one trace id.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    /// The trace ID.
    pub trace_id: String,

    /// Spans ordered by start time ascending.
    pub spans: Vec<Arc<Span>>,
}

impl Trace {
    /// Creates a trace from spans, ordering them by start time.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, mut spans: Vec<Arc<Span>>) -> Self {
        spans.sort_by_key(|s| s.start_time);
        Self {
            trace_id: trace_id.into(),
            spans,
        }
    }

    /// Returns the first root span, if one was retained.
    #[must_use]
    pub fn root_span(&self) -> Option<&Span> {
        self.spans.iter().find(|s| s.is_root()).map(AsRef::as_ref)
    }

    /// Returns the distinct services participating in this trace, sorted.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        self.spans
            .iter()
            .map(|s| s.service.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the wall-clock extent of the trace in milliseconds.
    ///
    /// Returns `None` if no spans are present.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_ms(&self) -> Option<f64> {
        let start = self.spans.iter().map(|s| s.start_time).min()?;
        let end = self.spans.iter().map(|s| s.end_time).max()?;
        let duration = end - start;
        Some(match duration.num_nanoseconds() {
            Some(nanos) => nanos as f64 / 1_000_000.0,
            None => duration.num_milliseconds() as f64,
        })
    }

    /// Returns the number of spans that ended in error.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.spans.iter().filter(|s| s.is_error()).count()
    }
}
