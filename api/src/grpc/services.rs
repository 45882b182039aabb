//! gRPC service implementations for OTLP collectors.

use super::receiver::ReceiverState;
use shared::models::TelemetryBatch;
use shared::otlp::conversions::{logs_from_request, metrics_from_request, spans_from_request};
use shared::otlp::proto;
use shared::storage::TelemetryStore;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Implementation of the OTLP `TraceService` gRPC service.
#[derive(Debug, Clone)]
pub struct TracesServiceImpl {
    store: Arc<TelemetryStore>,
    state: Arc<ReceiverState>,
}

impl TracesServiceImpl {
    /// Creates a new `TracesServiceImpl` feeding `store`.
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>, state: Arc<ReceiverState>) -> Self {
        Self { store, state }
    }
}

#[tonic::async_trait]
impl proto::collector::trace::v1::trace_service_server::TraceService for TracesServiceImpl {
    async fn export(
        &self,
        request: Request<proto::collector::trace::v1::ExportTraceServiceRequest>,
    ) -> Result<Response<proto::collector::trace::v1::ExportTraceServiceResponse>, Status> {
        let spans = spans_from_request(request.get_ref());
        let counts = self.store.add_batch(TelemetryBatch {
            spans,
            ..TelemetryBatch::default()
        });
        self.state.record_spans(counts.spans);

        tracing::debug!(spans = counts.spans, "Processed OTLP gRPC traces");

        Ok(Response::new(
            proto::collector::trace::v1::ExportTraceServiceResponse {
                partial_success: None,
            },
        ))
    }
}

/// Implementation of the OTLP `LogsService` gRPC service.
#[derive(Debug, Clone)]
pub struct LogsServiceImpl {
    store: Arc<TelemetryStore>,
    state: Arc<ReceiverState>,
}

impl LogsServiceImpl {
    /// Creates a new `LogsServiceImpl` feeding `store`.
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>, state: Arc<ReceiverState>) -> Self {
        Self { store, state }
    }
}

#[tonic::async_trait]
impl proto::collector::logs::v1::logs_service_server::LogsService for LogsServiceImpl {
    async fn export(
        &self,
        request: Request<proto::collector::logs::v1::ExportLogsServiceRequest>,
    ) -> Result<Response<proto::collector::logs::v1::ExportLogsServiceResponse>, Status> {
        let logs = logs_from_request(request.get_ref());
        let counts = self.store.add_batch(TelemetryBatch {
            logs,
            ..TelemetryBatch::default()
        });
        self.state.record_logs(counts.logs);

        tracing::debug!(logs = counts.logs, "Processed OTLP gRPC logs");

        Ok(Response::new(
            proto::collector::logs::v1::ExportLogsServiceResponse {
                partial_success: None,
            },
        ))
    }
}

/// Implementation of the OTLP `MetricsService` gRPC service.
#[derive(Debug, Clone)]
pub struct MetricsServiceImpl {
    store: Arc<TelemetryStore>,
    state: Arc<ReceiverState>,
}

impl MetricsServiceImpl {
    /// Creates a new `MetricsServiceImpl` feeding `store`.
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>, state: Arc<ReceiverState>) -> Self {
        Self { store, state }
    }
}

#[tonic::async_trait]
impl proto::collector::metrics::v1::metrics_service_server::MetricsService for MetricsServiceImpl {
    async fn export(
        &self,
        request: Request<proto::collector::metrics::v1::ExportMetricsServiceRequest>,
    ) -> Result<Response<proto::collector::metrics::v1::ExportMetricsServiceResponse>, Status>
    {
        let metrics = metrics_from_request(request.get_ref());
        let counts = self.store.add_batch(TelemetryBatch {
            metrics,
            ..TelemetryBatch::default()
        });
        self.state.record_metrics(counts.metrics);

        tracing::debug!(metrics = counts.metrics, "Processed OTLP gRPC metrics");

        Ok(Response::new(
            proto::collector::metrics::v1::ExportMetricsServiceResponse {
                partial_success: None,
            },
        ))
    }
}
