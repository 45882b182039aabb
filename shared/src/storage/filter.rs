//! Filters applied to store snapshots.
//!
//! Every filter is conjunctive: an entity must satisfy each criterion that is
//! set. Unset criteria always match.

use crate::models::{CodeLocation, LogRecord, MetricPoint, Span};
use chrono::{DateTime, Utc};

fn code_matches(code: Option<&CodeLocation>, filepath: Option<&str>, function: Option<&str>) -> bool {
    if filepath.is_none() && function.is_none() {
        return true;
    }
    code.is_some_and(|c| c.matches(filepath, function))
}

/// Query parameters for retrieving spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanQuery {
    /// Exact service name.
    pub service: Option<String>,

    /// Only spans with status `ERROR`.
    pub errors_only: bool,

    /// Spans starting at or after this time.
    pub since: Option<DateTime<Utc>>,

    /// Substring of the code file path.
    pub code_filepath: Option<String>,

    /// Substring of the code function name.
    pub code_function: Option<String>,
}

impl SpanQuery {
    /// Creates a new empty query (matches all spans).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service filter.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Restricts results to error spans.
    #[must_use]
    pub fn errors_only(mut self) -> Self {
        self.errors_only = true;
        self
    }

    /// Sets the inclusive lower time bound.
    #[must_use]
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Sets the code file path substring filter.
    #[must_use]
    pub fn with_code_filepath(mut self, filepath: impl Into<String>) -> Self {
        self.code_filepath = Some(filepath.into());
        self
    }

    /// Sets the code function substring filter.
    #[must_use]
    pub fn with_code_function(mut self, function: impl Into<String>) -> Self {
        self.code_function = Some(function.into());
        self
    }

    /// Returns true if the span satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, span: &Span) -> bool {
        if self.service.as_deref().is_some_and(|s| s != span.service) {
            return false;
        }
        if self.errors_only && !span.is_error() {
            return false;
        }
        if self.since.is_some_and(|since| span.start_time < since) {
            return false;
        }
        code_matches(
            span.code.as_ref(),
            self.code_filepath.as_deref(),
            self.code_function.as_deref(),
        )
    }
}

/// Query parameters for retrieving log records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Exact service name.
    pub service: Option<String>,

    /// Exact severity name.
    pub severity: Option<String>,

    /// Only `ERROR` and `FATAL` records.
    pub errors_only: bool,

    /// Records at or after this time.
    pub since: Option<DateTime<Utc>>,

    /// Substring of the code file path.
    pub code_filepath: Option<String>,

    /// Substring of the code function name.
    pub code_function: Option<String>,
}

impl LogQuery {
    /// Creates a new empty query (matches all logs).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service filter.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Sets the exact severity filter.
    #[must_use]
    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    /// Restricts results to error and fatal records.
    #[must_use]
    pub fn errors_only(mut self) -> Self {
        self.errors_only = true;
        self
    }

    /// Sets the inclusive lower time bound.
    #[must_use]
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Sets the code file path substring filter.
    #[must_use]
    pub fn with_code_filepath(mut self, filepath: impl Into<String>) -> Self {
        self.code_filepath = Some(filepath.into());
        self
    }

    /// Sets the code function substring filter.
    #[must_use]
    pub fn with_code_function(mut self, function: impl Into<String>) -> Self {
        self.code_function = Some(function.into());
        self
    }

    /// Returns true if the log record satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, log: &LogRecord) -> bool {
        if self.service.as_deref().is_some_and(|s| s != log.service) {
            return false;
        }
        if self.severity.as_deref().is_some_and(|s| s != log.severity) {
            return false;
        }
        if self.errors_only && !log.is_error() {
            return false;
        }
        if self.since.is_some_and(|since| log.timestamp < since) {
            return false;
        }
        code_matches(
            log.code.as_ref(),
            self.code_filepath.as_deref(),
            self.code_function.as_deref(),
        )
    }
}

/// Query parameters for retrieving metric points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricQuery {
    /// Exact service name.
    pub service: Option<String>,

    /// Exact metric name.
    pub name: Option<String>,

    /// Points at or after this time.
    pub since: Option<DateTime<Utc>>,
}

impl MetricQuery {
    /// Creates a new empty query (matches all points).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service filter.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Sets the metric name filter.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the inclusive lower time bound.
    #[must_use]
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Returns true if the point satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, point: &MetricPoint) -> bool {
        if self.service.as_deref().is_some_and(|s| s != point.service) {
            return false;
        }
        if self.name.as_deref().is_some_and(|n| n != point.name) {
            return false;
        }
        !self.since.is_some_and(|since| point.timestamp < since)
    }
}
