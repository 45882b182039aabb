//! Derived aggregates over store snapshots.
//!
//! Everything here is a pure function of the entities handed in; windowing
//! and store access live in [`crate::query`].

pub mod health;
pub mod incident;
pub mod locations;

pub use health::{HealthStatus, LogHealth, ServiceHealth, SpanHealth};
pub use incident::{
    AnalysisWindow, IncidentReport, IncidentSummary, RecentErrors, SlowOperation,
};
pub use locations::{aggregate_locations, CodeLocationSummary};

/// Percentage of `errors` in `total`, 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn error_rate_percent(total: usize, errors: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        errors as f64 / total as f64 * 100.0
    }
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
