//! Bounded in-memory storage for telemetry.
//!
//! [`TelemetryStore`] is the single point of truth shared by every
//! ingestion path and every reader. The query types in [`filter`] select
//! entities from store snapshots.

pub mod filter;
pub mod telemetry_store;

pub use filter::{LogQuery, MetricQuery, SpanQuery};
pub use telemetry_store::{
    BatchCounts, ErrorReport, ErrorSummary, StoreStats, TelemetryStore, TimeRange,
};
