//! Decode rules shared by the protobuf and JSON ingestion paths.

use crate::models::{AttributeValue, Attributes};
use chrono::{DateTime, Utc};
use std::time::{Duration, UNIX_EPOCH};

/// Resource attribute naming the emitting service.
pub const SERVICE_NAME_KEY: &str = "service.name";

/// Service name used when a resource carries no `service.name`.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Converts an OTLP timestamp (nanoseconds since epoch) to a `DateTime<Utc>`.
#[must_use]
pub fn timestamp_to_datetime(nanos: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from(UNIX_EPOCH + Duration::from_nanos(nanos))
}

/// Like [`timestamp_to_datetime`], treating `0` as "not set".
#[must_use]
pub fn nonzero_timestamp(nanos: u64) -> Option<DateTime<Utc>> {
    (nanos > 0).then(|| timestamp_to_datetime(nanos))
}

/// Picks a log record's time: event time, then observed time, then `received`.
#[must_use]
pub fn log_timestamp(
    time: Option<DateTime<Utc>>,
    observed: Option<DateTime<Utc>>,
    received: DateTime<Utc>,
) -> DateTime<Utc> {
    time.or(observed).unwrap_or(received)
}

/// Reads `service.name` from resource attributes.
#[must_use]
pub fn service_name(resource_attributes: &Attributes) -> String {
    resource_attributes
        .get(SERVICE_NAME_KEY)
        .map(AttributeValue::to_string)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_SERVICE.to_string())
}

/// Hex-encodes a protobuf id; empty input yields an empty string.
#[must_use]
pub fn id_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Hex-encodes an optional protobuf id; empty input yields `None`.
#[must_use]
pub fn optional_id_to_hex(bytes: &[u8]) -> Option<String> {
    (!bytes.is_empty()).then(|| hex::encode(bytes))
}

/// Normalises a JSON id: trimmed and lowercased.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Normalises an optional JSON id; blank input yields `None`.
#[must_use]
pub fn optional_id(id: Option<&str>) -> Option<String> {
    id.map(normalize_id).filter(|s| !s.is_empty())
}

/// Converts a metric value to `f64`, accepting precision loss for huge ints.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn int_to_f64(value: i64) -> f64 {
    value as f64
}

/// Converts a histogram count to `f64`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn count_to_f64(count: u64) -> f64 {
    count as f64
}
