//! Canonical telemetry data models.
//!
//! Both ingestion paths (OTLP JSON files and OTLP gRPC) decode into these
//! types, so the store and query layers never see wire formats.

pub mod attribute;
pub mod code;
pub mod log;
pub mod metric;
pub mod trace;
pub mod view;

pub use attribute::{AttributeValue, Attributes};
pub use code::{CodeLocation, CodeLocationKey};
pub use log::{LogRecord, Severity};
pub use metric::{MetricKind, MetricPoint};
pub use trace::{Span, SpanEvent, SpanStatus, Trace};
pub use view::{LogView, SpanView};

/// A decoded group of entities ready to be appended to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryBatch {
    /// Decoded spans.
    pub spans: Vec<Span>,
    /// Decoded log records.
    pub logs: Vec<LogRecord>,
    /// Decoded metric points.
    pub metrics: Vec<MetricPoint>,
}

impl TelemetryBatch {
    /// Returns true if the batch holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.logs.is_empty() && self.metrics.is_empty()
    }

    /// Moves every entity of `other` into this batch.
    pub fn extend(&mut self, other: TelemetryBatch) {
        self.spans.extend(other.spans);
        self.logs.extend(other.logs);
        self.metrics.extend(other.metrics);
    }
}
