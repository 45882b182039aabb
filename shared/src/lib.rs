//! otelwatch shared library
//!
//! Canonical telemetry models, the bounded in-memory store, OTLP decoding
//! for both the protobuf and the JSON encoding, incremental file ingestion
//! and the query and incident-analysis surface used by the server and CLI.
//!
//! # Modules
//!
//! - [`models`] - Spans, log records, metric points and their attributes
//! - [`config`] - Store capacities
//! - [`storage`] - The fixed-capacity store and its query filters
//! - [`otlp`] - OTLP protobuf and JSON decoding
//! - [`ingest`] - Offset-tracking file tailer
//! - [`analysis`] - Incident report, service health, code locations
//! - [`query`] - Read operations with documented defaults
//!
//! # Example
//!
//! ```
//! use shared::models::{LogRecord, Severity};
//! use shared::storage::{LogQuery, TelemetryStore};
//!
//! let store = TelemetryStore::default();
//! store.add_log(
//!     LogRecord::new(Severity::Error, "payment declined", "payment-service")
//!         .with_trace_id("4bf92f3577b34da6a3ce929d0e0e4736"),
//! );
//!
//! let errors = store.get_recent_logs(10, &LogQuery::new().errors_only());
//! assert_eq!(errors.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod models;
pub mod otlp;
pub mod query;
pub mod storage;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
