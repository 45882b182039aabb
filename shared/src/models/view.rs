//! Serialized presentations of stored entities with derived fields.

use super::log::LogRecord;
use super::trace::Span;
use serde::Serialize;
use std::sync::Arc;

/// A span as returned to callers: every stored field plus `duration_ms`
/// and `is_error`.
#[derive(Debug, Clone, Serialize)]
pub struct SpanView {
    /// The stored span.
    #[serde(flatten)]
    pub span: Arc<Span>,
    /// Fractional milliseconds between start and end.
    pub duration_ms: f64,
    /// Whether the status is `ERROR`.
    pub is_error: bool,
}

impl From<Arc<Span>> for SpanView {
    fn from(span: Arc<Span>) -> Self {
        Self {
            duration_ms: span.duration_ms(),
            is_error: span.is_error(),
            span,
        }
    }
}

/// A log record as returned to callers, with `is_error`.
#[derive(Debug, Clone, Serialize)]
pub struct LogView {
    /// The stored log record.
    #[serde(flatten)]
    pub log: Arc<LogRecord>,
    /// Whether the severity is `ERROR` or `FATAL`.
    pub is_error: bool,
}

impl From<Arc<LogRecord>> for LogView {
    fn from(log: Arc<LogRecord>) -> Self {
        Self {
            is_error: log.is_error(),
            log,
        }
    }
}
