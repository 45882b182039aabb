//! OTLP JSON decoding for export files.
//!
//! The structs below mirror the OTLP JSON mapping (camelCase keys, ids as hex
//! strings, 64-bit integers as strings) but are lenient: numbers may arrive as
//! numbers or strings, timestamps may be RFC 3339 text, status codes may be
//! enum names, and every field is optional.

use super::decode::{
    count_to_f64, log_timestamp, normalize_id, optional_id, service_name, timestamp_to_datetime,
};
use crate::models::{
    AttributeValue, Attributes, CodeLocation, LogRecord, MetricKind, MetricPoint, Severity, Span,
    SpanEvent, SpanStatus, TelemetryBatch,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Which signal a JSON document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Spans.
    Traces,
    /// Log records.
    Logs,
    /// Metric points.
    Metrics,
}

impl SignalKind {
    /// Guesses the signal from a lowercase file stem.
    ///
    /// `trace`/`span` means traces, `log` logs and `metric` metrics,
    /// checked in that order.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        if hint.contains("trace") || hint.contains("span") {
            Some(Self::Traces)
        } else if hint.contains("log") {
            Some(Self::Logs)
        } else if hint.contains("metric") {
            Some(Self::Metrics)
        } else {
            None
        }
    }
}

/// Errors raised while decoding one OTLP JSON document.
#[derive(Debug, Error)]
pub enum JsonDecodeError {
    /// The document has no top-level signal key and the hint names none.
    #[error("document carries no recognised OTLP signal")]
    UnknownSignal,

    /// The document does not match the OTLP JSON shape.
    #[error("malformed OTLP JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A number that exporters may encode as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum JsonNumber {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl JsonNumber {
    #[allow(clippy::cast_possible_truncation)]
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Unsigned(n) => i64::try_from(*n).ok(),
            Self::Signed(n) => Some(*n),
            Self::Float(f) if f.is_finite() => Some(*f as i64),
            Self::Float(_) => None,
            Self::Text(s) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Unsigned(n) => Some(*n as f64),
            Self::Signed(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Interprets the value as a timestamp: nanoseconds since epoch, or
    /// RFC 3339 / naive ISO 8601 text. Returns `None` if unparseable.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unsigned(n) => Some(timestamp_to_datetime(*n)),
            Self::Signed(n) => u64::try_from(*n).ok().map(timestamp_to_datetime),
            Self::Float(f) if f.is_finite() && *f >= 0.0 => Some(timestamp_to_datetime(*f as u64)),
            Self::Float(_) => None,
            Self::Text(s) => {
                let s = s.trim();
                if let Ok(nanos) = s.parse::<u64>() {
                    return Some(timestamp_to_datetime(nanos));
                }
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
                    .or_else(|| {
                        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                            .ok()
                            .map(|naive| naive.and_utc())
                    })
            }
        }
    }
}

fn epoch() -> DateTime<Utc> {
    timestamp_to_datetime(0)
}

/// A set, non-zero timestamp.
fn event_time(value: Option<&JsonNumber>) -> Option<DateTime<Utc>> {
    value
        .and_then(JsonNumber::to_datetime)
        .filter(|dt| *dt != epoch())
}

/// A span boundary: absent means epoch (as in protobuf), unparseable means `received`.
fn span_time(value: Option<&JsonNumber>, received: DateTime<Utc>) -> DateTime<Utc> {
    match value {
        None => epoch(),
        Some(v) => v.to_datetime().unwrap_or(received),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnyValueJson {
    string_value: Option<String>,
    bool_value: Option<bool>,
    int_value: Option<JsonNumber>,
    double_value: Option<JsonNumber>,
    array_value: Option<ArrayValueJson>,
    kvlist_value: Option<KvListJson>,
    bytes_value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArrayValueJson {
    values: Vec<AnyValueJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KvListJson {
    values: Vec<KeyValueJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KeyValueJson {
    key: String,
    value: Option<AnyValueJson>,
}

impl AnyValueJson {
    fn to_json(&self) -> Value {
        if let Some(ref s) = self.string_value {
            Value::String(s.clone())
        } else if let Some(b) = self.bool_value {
            Value::Bool(b)
        } else if let Some(i) = self.int_value.as_ref().and_then(JsonNumber::as_i64) {
            Value::from(i)
        } else if let Some(d) = self.double_value.as_ref().and_then(JsonNumber::as_f64) {
            serde_json::Number::from_f64(d).map_or(Value::Null, Value::Number)
        } else if let Some(ref arr) = self.array_value {
            Value::Array(arr.values.iter().map(Self::to_json).collect())
        } else if let Some(ref kv) = self.kvlist_value {
            Value::Object(
                kv.values
                    .iter()
                    .filter_map(|pair| pair.value.as_ref().map(|v| (pair.key.clone(), v.to_json())))
                    .collect(),
            )
        } else if let Some(ref b) = self.bytes_value {
            Value::String(b.clone())
        } else {
            Value::Null
        }
    }

    fn to_attribute(&self) -> AttributeValue {
        if let Some(ref s) = self.string_value {
            return AttributeValue::String(s.clone());
        }
        if let Some(b) = self.bool_value {
            return AttributeValue::Bool(b);
        }
        if let Some(ref i) = self.int_value {
            return i.as_i64().map_or_else(
                || AttributeValue::String(value_text(i)),
                AttributeValue::Int,
            );
        }
        if let Some(d) = self.double_value.as_ref().and_then(JsonNumber::as_f64) {
            return AttributeValue::Float(d);
        }
        if self.array_value.is_some() || self.kvlist_value.is_some() {
            return AttributeValue::String(self.to_json().to_string());
        }
        // JSON bytes are already base64.
        AttributeValue::String(self.bytes_value.clone().unwrap_or_default())
    }

    fn to_body(&self) -> String {
        match self.string_value {
            Some(ref s) => s.clone(),
            None => self.to_attribute().to_string(),
        }
    }
}

fn value_text(number: &JsonNumber) -> String {
    match number {
        JsonNumber::Unsigned(n) => n.to_string(),
        JsonNumber::Signed(n) => n.to_string(),
        JsonNumber::Float(f) => f.to_string(),
        JsonNumber::Text(s) => s.clone(),
    }
}

fn attributes(pairs: &[KeyValueJson]) -> Attributes {
    pairs
        .iter()
        .map(|kv| {
            let value = kv
                .value
                .as_ref()
                .map_or_else(|| AttributeValue::String(String::new()), AnyValueJson::to_attribute);
            (kv.key.clone(), value)
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceJson {
    attributes: Vec<KeyValueJson>,
}

fn resource_service(resource: Option<&ResourceJson>) -> String {
    service_name(&resource.map(|r| attributes(&r.attributes)).unwrap_or_default())
}

// ====== Traces ======

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TracesDataJson {
    resource_spans: Vec<ResourceSpansJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResourceSpansJson {
    resource: Option<ResourceJson>,
    #[serde(alias = "instrumentationLibrarySpans")]
    scope_spans: Vec<ScopeSpansJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScopeSpansJson {
    spans: Vec<SpanJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum StatusCodeJson {
    #[default]
    Missing,
    Number(i64),
    Name(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusJson {
    code: StatusCodeJson,
}

impl StatusJson {
    fn status(&self) -> SpanStatus {
        match self.code {
            StatusCodeJson::Missing => SpanStatus::Unset,
            StatusCodeJson::Number(code) => SpanStatus::from_code(code),
            StatusCodeJson::Name(ref name) => SpanStatus::from_name(name),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EventJson {
    name: String,
    time_unix_nano: Option<JsonNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpanJson {
    trace_id: String,
    span_id: String,
    parent_span_id: Option<String>,
    name: String,
    start_time_unix_nano: Option<JsonNumber>,
    end_time_unix_nano: Option<JsonNumber>,
    attributes: Vec<KeyValueJson>,
    events: Vec<EventJson>,
    status: Option<StatusJson>,
}

impl ResourceSpansJson {
    fn into_spans(self, received: DateTime<Utc>) -> Vec<Span> {
        let service = resource_service(self.resource.as_ref());
        self.scope_spans
            .into_iter()
            .flat_map(|scope| scope.spans)
            .map(|span| {
                let attributes = attributes(&span.attributes);
                Span {
                    trace_id: normalize_id(&span.trace_id),
                    span_id: normalize_id(&span.span_id),
                    parent_span_id: optional_id(span.parent_span_id.as_deref()),
                    name: span.name,
                    service: service.clone(),
                    start_time: span_time(span.start_time_unix_nano.as_ref(), received),
                    end_time: span_time(span.end_time_unix_nano.as_ref(), received),
                    status: span.status.as_ref().map_or(SpanStatus::Unset, StatusJson::status),
                    events: span
                        .events
                        .into_iter()
                        .map(|e| SpanEvent {
                            timestamp: span_time(e.time_unix_nano.as_ref(), received),
                            name: e.name,
                        })
                        .collect(),
                    code: CodeLocation::from_attributes(&attributes),
                    attributes,
                }
            })
            .collect()
    }
}

// ====== Logs ======

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LogsDataJson {
    resource_logs: Vec<ResourceLogsJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResourceLogsJson {
    resource: Option<ResourceJson>,
    #[serde(alias = "instrumentationLibraryLogs")]
    scope_logs: Vec<ScopeLogsJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ScopeLogsJson {
    log_records: Vec<LogRecordJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LogRecordJson {
    time_unix_nano: Option<JsonNumber>,
    observed_time_unix_nano: Option<JsonNumber>,
    severity_number: Option<JsonNumber>,
    severity_text: Option<String>,
    body: Option<AnyValueJson>,
    attributes: Vec<KeyValueJson>,
    trace_id: Option<String>,
    span_id: Option<String>,
}

impl LogRecordJson {
    fn severity(&self) -> String {
        let text = self.severity_text.as_deref().unwrap_or_default();
        if !text.is_empty() {
            return text.to_string();
        }
        let number = self.severity_number.as_ref();
        if let Some(JsonNumber::Text(name)) = number {
            if let Some(severity) = Severity::from_enum_name(name) {
                return severity.into();
            }
        }
        let number = number
            .and_then(JsonNumber::as_i64)
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or_default();
        Severity::resolve_name(number, "")
    }
}

impl ResourceLogsJson {
    fn into_logs(self, received: DateTime<Utc>) -> Vec<LogRecord> {
        let service = resource_service(self.resource.as_ref());
        self.scope_logs
            .into_iter()
            .flat_map(|scope| scope.log_records)
            .map(|record| {
                let attributes = attributes(&record.attributes);
                LogRecord {
                    timestamp: log_timestamp(
                        event_time(record.time_unix_nano.as_ref()),
                        event_time(record.observed_time_unix_nano.as_ref()),
                        received,
                    ),
                    severity: record.severity(),
                    body: record.body.as_ref().map(AnyValueJson::to_body).unwrap_or_default(),
                    service: service.clone(),
                    trace_id: optional_id(record.trace_id.as_deref()),
                    span_id: optional_id(record.span_id.as_deref()),
                    code: CodeLocation::from_attributes(&attributes),
                    attributes,
                }
            })
            .collect()
    }
}

// ====== Metrics ======

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MetricsDataJson {
    resource_metrics: Vec<ResourceMetricsJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResourceMetricsJson {
    resource: Option<ResourceJson>,
    #[serde(alias = "instrumentationLibraryMetrics")]
    scope_metrics: Vec<ScopeMetricsJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScopeMetricsJson {
    metrics: Vec<MetricJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DataPointsJson {
    data_points: Vec<DataPointJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DataPointJson {
    time_unix_nano: Option<JsonNumber>,
    as_double: Option<JsonNumber>,
    as_int: Option<JsonNumber>,
    count: Option<JsonNumber>,
    attributes: Vec<KeyValueJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MetricJson {
    name: String,
    unit: String,
    gauge: Option<DataPointsJson>,
    sum: Option<DataPointsJson>,
    histogram: Option<DataPointsJson>,
    exponential_histogram: Option<Value>,
    summary: Option<Value>,
}

impl DataPointJson {
    fn number(&self) -> f64 {
        self.as_double
            .as_ref()
            .and_then(JsonNumber::as_f64)
            .or_else(|| self.as_int.as_ref().and_then(JsonNumber::as_f64))
            .unwrap_or_default()
    }

    fn count(&self) -> f64 {
        self.count
            .as_ref()
            .and_then(JsonNumber::as_i64)
            .and_then(|c| u64::try_from(c).ok())
            .map_or(0.0, count_to_f64)
    }
}

impl MetricJson {
    fn into_points(self, service: &str, received: DateTime<Utc>) -> Vec<MetricPoint> {
        let (kind, points) = if let Some(gauge) = self.gauge {
            (MetricKind::Gauge, gauge.data_points)
        } else if let Some(sum) = self.sum {
            (MetricKind::Sum, sum.data_points)
        } else if let Some(histogram) = self.histogram {
            (MetricKind::Histogram, histogram.data_points)
        } else {
            if self.exponential_histogram.is_some() || self.summary.is_some() {
                tracing::debug!(metric = %self.name, "ignoring unsupported metric kind");
            }
            return Vec::new();
        };

        points
            .into_iter()
            .map(|p| MetricPoint {
                timestamp: event_time(p.time_unix_nano.as_ref()).unwrap_or(received),
                name: self.name.clone(),
                value: if kind == MetricKind::Histogram {
                    p.count()
                } else {
                    p.number()
                },
                service: service.to_string(),
                unit: self.unit.clone(),
                kind,
                attributes: attributes(&p.attributes),
            })
            .collect()
    }
}

impl ResourceMetricsJson {
    fn into_points(self, received: DateTime<Utc>) -> Vec<MetricPoint> {
        let service = resource_service(self.resource.as_ref());
        self.scope_metrics
            .into_iter()
            .flat_map(|scope| scope.metrics)
            .flat_map(|metric| metric.into_points(&service, received))
            .collect()
    }
}

/// Decodes one OTLP JSON document.
///
/// Documents with a top-level `resourceSpans`, `resourceLogs` or
/// `resourceMetrics` key are decoded as such. Otherwise `hint` (a lowercase
/// file stem) selects the signal and the document is decoded as a single
/// resource-level object.
///
/// # Errors
///
/// Returns an error if the signal cannot be determined or the document does
/// not have the expected shape.
pub fn decode_document(value: Value, hint: &str) -> Result<TelemetryBatch, JsonDecodeError> {
    let received = Utc::now();
    let mut batch = TelemetryBatch::default();

    if value.get("resourceSpans").is_some() {
        let data: TracesDataJson = serde_json::from_value(value)?;
        batch.spans = data
            .resource_spans
            .into_iter()
            .flat_map(|r| r.into_spans(received))
            .collect();
        return Ok(batch);
    }
    if value.get("resourceLogs").is_some() {
        let data: LogsDataJson = serde_json::from_value(value)?;
        batch.logs = data
            .resource_logs
            .into_iter()
            .flat_map(|r| r.into_logs(received))
            .collect();
        return Ok(batch);
    }
    if value.get("resourceMetrics").is_some() {
        let data: MetricsDataJson = serde_json::from_value(value)?;
        batch.metrics = data
            .resource_metrics
            .into_iter()
            .flat_map(|r| r.into_points(received))
            .collect();
        return Ok(batch);
    }

    let kind = SignalKind::from_hint(hint).ok_or(JsonDecodeError::UnknownSignal)?;
    match kind {
        SignalKind::Traces => {
            let resource: ResourceSpansJson = serde_json::from_value(value)?;
            batch.spans = resource.into_spans(received);
        }
        SignalKind::Logs => {
            let resource: ResourceLogsJson = serde_json::from_value(value)?;
            batch.logs = resource.into_logs(received);
        }
        SignalKind::Metrics => {
            let resource: ResourceMetricsJson = serde_json::from_value(value)?;
            batch.metrics = resource.into_points(received);
        }
    }
    Ok(batch)
}
