//! Conversions from OTLP protobuf messages to the canonical models.
//!
//! Decoding is total: every span, log record and supported data point in a
//! request produces exactly one entity, with defaults for missing fields.

use super::decode::{
    count_to_f64, id_to_hex, int_to_f64, log_timestamp, nonzero_timestamp, optional_id_to_hex,
    service_name, timestamp_to_datetime,
};
use crate::models::{
    AttributeValue, Attributes, CodeLocation, LogRecord, MetricKind, MetricPoint, Severity, Span,
    SpanEvent, SpanStatus,
};
use crate::otlp::proto;
use chrono::{DateTime, Utc};
use proto::collector::logs::v1::ExportLogsServiceRequest;
use proto::collector::metrics::v1::ExportMetricsServiceRequest;
use proto::collector::trace::v1::ExportTraceServiceRequest;
use proto::common::v1::{any_value::Value, AnyValue, KeyValue};

/// Converts OTLP `AnyValue` to `serde_json::Value`.
fn any_value_to_json(value: &AnyValue) -> serde_json::Value {
    match &value.value {
        Some(Value::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Value::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Value::IntValue(i)) => serde_json::Value::Number((*i).into()),
        Some(Value::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Some(Value::ArrayValue(arr)) => {
            serde_json::Value::Array(arr.values.iter().map(any_value_to_json).collect())
        }
        Some(Value::KvlistValue(kv)) => {
            let mut map = serde_json::Map::new();
            for pair in &kv.values {
                if let Some(ref v) = pair.value {
                    map.insert(pair.key.clone(), any_value_to_json(v));
                }
            }
            serde_json::Value::Object(map)
        }
        Some(Value::BytesValue(b)) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
        None => serde_json::Value::Null,
    }
}

/// Converts OTLP `AnyValue` to a scalar attribute.
///
/// Arrays and key-value lists become compact JSON text, bytes become base64
/// and an empty value becomes the empty string.
#[must_use]
pub fn any_value_to_attribute(value: &AnyValue) -> AttributeValue {
    match &value.value {
        Some(Value::StringValue(s)) => AttributeValue::String(s.clone()),
        Some(Value::BoolValue(b)) => AttributeValue::Bool(*b),
        Some(Value::IntValue(i)) => AttributeValue::Int(*i),
        Some(Value::DoubleValue(d)) => AttributeValue::Float(*d),
        Some(Value::BytesValue(b)) => {
            use base64::Engine;
            AttributeValue::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
        Some(Value::ArrayValue(_) | Value::KvlistValue(_)) => {
            AttributeValue::String(any_value_to_json(value).to_string())
        }
        None => AttributeValue::String(String::new()),
    }
}

/// Converts OTLP key-value pairs to an attribute map.
#[must_use]
pub fn key_values_to_attributes(attributes: &[KeyValue]) -> Attributes {
    attributes
        .iter()
        .map(|kv| {
            let value = kv
                .value
                .as_ref()
                .map_or_else(|| AttributeValue::String(String::new()), any_value_to_attribute);
            (kv.key.clone(), value)
        })
        .collect()
}

/// Resolves the service name of an optional resource.
#[must_use]
pub fn resource_service(resource: Option<&proto::resource::v1::Resource>) -> String {
    let attributes = resource
        .map(|r| key_values_to_attributes(&r.attributes))
        .unwrap_or_default();
    service_name(&attributes)
}

/// Renders a log body: strings verbatim, anything else in printable form.
fn body_text(body: Option<&AnyValue>) -> String {
    match body {
        Some(AnyValue {
            value: Some(Value::StringValue(s)),
        }) => s.clone(),
        Some(other) => any_value_to_attribute(other).to_string(),
        None => String::new(),
    }
}

/// Converts an OTLP span owned by `service`.
#[must_use]
pub fn convert_span(span: &proto::trace::v1::Span, service: &str) -> Span {
    let attributes = key_values_to_attributes(&span.attributes);
    Span {
        trace_id: id_to_hex(&span.trace_id),
        span_id: id_to_hex(&span.span_id),
        parent_span_id: optional_id_to_hex(&span.parent_span_id),
        name: span.name.clone(),
        service: service.to_string(),
        start_time: timestamp_to_datetime(span.start_time_unix_nano),
        end_time: timestamp_to_datetime(span.end_time_unix_nano),
        status: span
            .status
            .as_ref()
            .map_or(SpanStatus::Unset, |s| SpanStatus::from_code(i64::from(s.code))),
        events: span
            .events
            .iter()
            .map(|e| SpanEvent {
                name: e.name.clone(),
                timestamp: timestamp_to_datetime(e.time_unix_nano),
            })
            .collect(),
        code: CodeLocation::from_attributes(&attributes),
        attributes,
    }
}

/// Converts an OTLP log record owned by `service`.
#[must_use]
pub fn convert_log(
    record: &proto::logs::v1::LogRecord,
    service: &str,
    received: DateTime<Utc>,
) -> LogRecord {
    let attributes = key_values_to_attributes(&record.attributes);
    LogRecord {
        timestamp: log_timestamp(
            nonzero_timestamp(record.time_unix_nano),
            nonzero_timestamp(record.observed_time_unix_nano),
            received,
        ),
        severity: Severity::resolve_name(record.severity_number, &record.severity_text),
        body: body_text(record.body.as_ref()),
        service: service.to_string(),
        trace_id: optional_id_to_hex(&record.trace_id),
        span_id: optional_id_to_hex(&record.span_id),
        code: CodeLocation::from_attributes(&attributes),
        attributes,
    }
}

fn metric_point(
    metric: &proto::metrics::v1::Metric,
    kind: MetricKind,
    value: f64,
    time_unix_nano: u64,
    attributes: &[KeyValue],
    service: &str,
    received: DateTime<Utc>,
) -> MetricPoint {
    MetricPoint {
        timestamp: nonzero_timestamp(time_unix_nano).unwrap_or(received),
        name: metric.name.clone(),
        value,
        service: service.to_string(),
        unit: metric.unit.clone(),
        kind,
        attributes: key_values_to_attributes(attributes),
    }
}

fn number_value(point: &proto::metrics::v1::NumberDataPoint) -> f64 {
    use proto::metrics::v1::number_data_point::Value as NumberValue;

    match point.value {
        Some(NumberValue::AsDouble(d)) => d,
        Some(NumberValue::AsInt(i)) => int_to_f64(i),
        None => 0.0,
    }
}

/// Flattens an OTLP metric into one point per data point.
///
/// Histogram points are valued at their sample count. Exponential
/// histograms and summaries yield nothing.
#[must_use]
pub fn convert_metric(
    metric: &proto::metrics::v1::Metric,
    service: &str,
    received: DateTime<Utc>,
) -> Vec<MetricPoint> {
    use proto::metrics::v1::metric::Data;

    match &metric.data {
        Some(Data::Gauge(gauge)) => gauge
            .data_points
            .iter()
            .map(|p| {
                metric_point(
                    metric,
                    MetricKind::Gauge,
                    number_value(p),
                    p.time_unix_nano,
                    &p.attributes,
                    service,
                    received,
                )
            })
            .collect(),
        Some(Data::Sum(sum)) => sum
            .data_points
            .iter()
            .map(|p| {
                metric_point(
                    metric,
                    MetricKind::Sum,
                    number_value(p),
                    p.time_unix_nano,
                    &p.attributes,
                    service,
                    received,
                )
            })
            .collect(),
        Some(Data::Histogram(histogram)) => histogram
            .data_points
            .iter()
            .map(|p| {
                metric_point(
                    metric,
                    MetricKind::Histogram,
                    count_to_f64(p.count),
                    p.time_unix_nano,
                    &p.attributes,
                    service,
                    received,
                )
            })
            .collect(),
        Some(Data::ExponentialHistogram(_)) => {
            tracing::debug!(metric = %metric.name, "ignoring exponential histogram");
            Vec::new()
        }
        Some(Data::Summary(_)) => {
            tracing::debug!(metric = %metric.name, "ignoring summary metric");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Decodes every span of a trace export request.
#[must_use]
pub fn spans_from_request(request: &ExportTraceServiceRequest) -> Vec<Span> {
    let mut spans = Vec::new();
    for resource_spans in &request.resource_spans {
        let service = resource_service(resource_spans.resource.as_ref());
        for scope_spans in &resource_spans.scope_spans {
            spans.extend(scope_spans.spans.iter().map(|s| convert_span(s, &service)));
        }
    }
    spans
}

/// Decodes every log record of a logs export request.
#[must_use]
pub fn logs_from_request(request: &ExportLogsServiceRequest) -> Vec<LogRecord> {
    let received = Utc::now();
    let mut logs = Vec::new();
    for resource_logs in &request.resource_logs {
        let service = resource_service(resource_logs.resource.as_ref());
        for scope_logs in &resource_logs.scope_logs {
            logs.extend(
                scope_logs
                    .log_records
                    .iter()
                    .map(|r| convert_log(r, &service, received)),
            );
        }
    }
    logs
}

/// Decodes every supported data point of a metrics export request.
#[must_use]
pub fn metrics_from_request(request: &ExportMetricsServiceRequest) -> Vec<MetricPoint> {
    let received = Utc::now();
    let mut points = Vec::new();
    for resource_metrics in &request.resource_metrics {
        let service = resource_service(resource_metrics.resource.as_ref());
        for scope_metrics in &resource_metrics.scope_metrics {
            for metric in &scope_metrics.metrics {
                points.extend(convert_metric(metric, &service, received));
            }
        }
    }
    points
}


#[cfg(test)]
#[path = "conversions_test.rs"]
mod conversions_test;
