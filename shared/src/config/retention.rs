//! Retention configuration for the bounded telemetry store.
//!
//! Retention is count-based: each signal keeps at most a fixed number of
//! entities and the oldest are evicted first.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Default span capacity.
pub const DEFAULT_MAX_SPANS: usize = 10_000;
/// Default log record capacity.
pub const DEFAULT_MAX_LOGS: usize = 10_000;
/// Default metric point capacity.
pub const DEFAULT_MAX_METRICS: usize = 5_000;
/// Upper bound accepted for any single capacity.
pub const MAX_CAPACITY: usize = 10_000_000;

/// Represents different types of observability data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Log records
    Logs,
    /// Metric points
    Metrics,
    /// Spans
    Traces,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logs => write!(f, "logs"),
            Self::Metrics => write!(f, "metrics"),
            Self::Traces => write!(f, "traces"),
        }
    }
}

/// Errors raised by an invalid retention configuration.
#[derive(Debug, Error)]
pub enum RetentionConfigError {
    /// One or more capacities are out of range.
    #[error("invalid retention capacities: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Per-signal capacities of the telemetry store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RetentionConfig {
    /// Maximum number of retained spans.
    #[validate(range(min = 1, max = 10_000_000))]
    pub max_spans: usize,
    /// Maximum number of retained log records.
    #[validate(range(min = 1, max = 10_000_000))]
    pub max_logs: usize,
    /// Maximum number of retained metric points.
    #[validate(range(min = 1, max = 10_000_000))]
    pub max_metrics: usize,
}

impl RetentionConfig {
    /// Creates a new retention configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared::config::{DataType, RetentionConfig};
    ///
    /// let config = RetentionConfig::new(100, 200, 50);
    /// assert_eq!(config.capacity(DataType::Logs), 200);
    /// assert!(config.check().is_ok());
    /// ```
    #[must_use]
    pub fn new(max_spans: usize, max_logs: usize, max_metrics: usize) -> Self {
        Self {
            max_spans,
            max_logs,
            max_metrics,
        }
    }

    /// Validates every capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if any capacity is zero or exceeds [`MAX_CAPACITY`].
    pub fn check(&self) -> Result<(), RetentionConfigError> {
        self.validate()?;
        Ok(())
    }

    /// Gets the capacity for a specific data type.
    #[must_use]
    pub fn capacity(&self, data_type: DataType) -> usize {
        match data_type {
            DataType::Logs => self.max_logs,
            DataType::Metrics => self.max_metrics,
            DataType::Traces => self.max_spans,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SPANS, DEFAULT_MAX_LOGS, DEFAULT_MAX_METRICS)
    }
}
