//! OTLP gRPC receiver.
//!
//! Implements the OpenTelemetry collector services for traces, logs and
//! metrics on top of the shared [`TelemetryStore`](shared::storage::TelemetryStore).
//! Standard OpenTelemetry SDK exporters can point at it directly.
//!
//! # Services
//!
//! - `TraceService` - Receives spans
//! - `LogsService` - Receives log records
//! - `MetricsService` - Receives metric points

mod receiver;
mod services;

pub use receiver::{OtlpReceiver, ReceiverError, ReceiverState, ReceiverStatus};
pub use services::{LogsServiceImpl, MetricsServiceImpl, TracesServiceImpl};
