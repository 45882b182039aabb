//! Log record data models.

use super::attribute::{AttributeValue, Attributes};
use super::code::CodeLocation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity bucket derived from an OTLP severity number.
///
/// OTLP defines 24 severity numbers grouped in blocks of four; each block
/// maps to one of these levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Severity numbers 1-4.
    Trace,
    /// Severity numbers 5-8.
    Debug,
    /// Severity numbers 9-12.
    Info,
    /// Severity numbers 13-16.
    Warn,
    /// Severity numbers 17-20.
    Error,
    /// Severity numbers 21-24.
    Fatal,
}

impl Severity {
    /// Buckets an OTLP severity number. Out-of-range numbers map to `Info`.
    #[must_use]
    pub fn from_number(number: i32) -> Self {
        match number {
            1..=4 => Self::Trace,
            5..=8 => Self::Debug,
            9..=12 => Self::Info,
            13..=16 => Self::Warn,
            17..=20 => Self::Error,
            21..=24 => Self::Fatal,
            _ => Self::Info,
        }
    }

    /// Parses an OTLP severity enum name such as `SEVERITY_NUMBER_WARN2`.
    ///
    /// Returns `None` for names that are not severity numbers.
    #[must_use]
    pub fn from_enum_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let base = upper
            .strip_prefix("SEVERITY_NUMBER_")?
            .trim_end_matches(|c: char| c.is_ascii_digit());
        match base {
            "TRACE" => Some(Self::Trace),
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            "FATAL" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Returns the canonical uppercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Resolves the severity name stored on a log record.
    ///
    /// Non-empty severity text wins verbatim; otherwise the number is bucketed.
    #[must_use]
    pub fn resolve_name(number: i32, text: &str) -> String {
        if text.is_empty() {
            Self::from_number(number).as_str().to_string()
        } else {
            text.to_string()
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

/// A log record.
///
/// # Example
///
/// ```
/// use shared::models::{LogRecord, Severity};
///
/// let log = LogRecord::new(Severity::Error, "payment declined", "payment-service")
///     .with_attribute("order.id", "A-17")
///     .with_trace_id("4bf92f3577b34da6a3ce929d0e0e4736");
///
/// assert!(log.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity name: a bucket name or the exporter's verbatim severity text.
    pub severity: String,

    /// The log message body.
    pub body: String,

    /// The service that generated this log.
    pub service: String,

    /// Trace ID for correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Span ID for correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,

    /// Log attributes.
    #[serde(default)]
    pub attributes: Attributes,

    /// Source location of the log statement, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeLocation>,
}

impl LogRecord {
    /// Creates a new log record timestamped now.
    #[must_use]
    pub fn new(
        severity: impl Into<String>,
        body: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            severity: severity.into(),
            body: body.into(),
            service: service.into(),
            trace_id: None,
            span_id: None,
            attributes: Attributes::new(),
            code: None,
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds an attribute to the log record.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the trace ID for correlation.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets the span ID for correlation.
    #[must_use]
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Sets the code location.
    #[must_use]
    pub fn with_code_location(mut self, code: CodeLocation) -> Self {
        self.code = Some(code);
        self
    }

    /// Returns true if the severity is exactly `ERROR` or `FATAL`.
    ///
    /// Verbatim exporter text such as `error` or `Critical` does not count.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error.as_str() || self.severity == Severity::Fatal.as_str()
    }
}
