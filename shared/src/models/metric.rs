//! Metric data model.
//!
//! Every OTLP data point is flattened into one scalar [`MetricPoint`].

use super::attribute::{AttributeValue, Attributes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The OTLP data kind a point was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// A gauge sample.
    #[default]
    Gauge,
    /// A sum (counter or up-down counter) sample.
    Sum,
    /// A histogram sample, reduced to its observation count.
    Histogram,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gauge => write!(f, "gauge"),
            Self::Sum => write!(f, "sum"),
            Self::Histogram => write!(f, "histogram"),
        }
    }
}

/// A single scalar metric measurement.
///
/// # Example
///
/// ```
/// use shared::models::{MetricKind, MetricPoint};
///
/// let point = MetricPoint::new("http.server.requests", 42.0, "api")
///     .with_kind(MetricKind::Sum)
///     .with_unit("1")
///     .with_attribute("http.route", "/orders");
///
/// assert_eq!(point.value, 42.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// When the point was recorded.
    pub timestamp: DateTime<Utc>,

    /// Metric name.
    pub name: String,

    /// Scalar value. For histograms this is the sample count.
    pub value: f64,

    /// The service that reported the metric.
    pub service: String,

    /// Unit string as declared by the instrument (may be empty).
    #[serde(default)]
    pub unit: String,

    /// Source data kind.
    #[serde(default)]
    pub kind: MetricKind,

    /// Data point attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl MetricPoint {
    /// Creates a new gauge point timestamped now.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64, service: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            name: name.into(),
            value,
            service: service.into(),
            unit: String::new(),
            kind: MetricKind::default(),
            attributes: Attributes::new(),
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the source data kind.
    #[must_use]
    pub fn with_kind(mut self, kind: MetricKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
