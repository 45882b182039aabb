//! Lifecycle of the OTLP gRPC receiver: bind, serve, stop and status.

use super::services::{LogsServiceImpl, MetricsServiceImpl, TracesServiceImpl};
use serde::Serialize;
use shared::otlp::proto::collector::{
    logs::v1::logs_service_server::LogsServiceServer,
    metrics::v1::metrics_service_server::MetricsServiceServer,
    trace::v1::trace_service_server::TraceServiceServer,
};
use shared::storage::TelemetryStore;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

/// Errors raised by the gRPC receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The listening socket could not be bound.
    #[error("failed to bind OTLP gRPC receiver to {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The server stopped with a transport error.
    #[error("OTLP gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    /// The server task panicked or was cancelled.
    #[error("OTLP gRPC server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Snapshot of the receiver state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverStatus {
    /// Whether the server task is serving.
    pub running: bool,
    /// Configured port.
    pub port: u16,
    /// Bound address, once listening.
    pub listen_address: Option<String>,
    /// Most recent bind or transport error.
    pub last_error: Option<String>,
    /// Spans accepted since start-up.
    pub spans_received: u64,
    /// Log records accepted since start-up.
    pub logs_received: u64,
    /// Metric points accepted since start-up.
    pub metrics_received: u64,
}

/// Shared, lock-light receiver state read by the status endpoint.
#[derive(Debug, Default)]
pub struct ReceiverState {
    running: AtomicBool,
    port: AtomicU16,
    listen_address: Mutex<Option<String>>,
    last_error: Mutex<Option<String>>,
    spans: AtomicU64,
    logs: AtomicU64,
    metrics: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ReceiverState {
    /// Creates state for a receiver configured on `port`.
    #[must_use]
    pub fn new(port: u16) -> Self {
        let state = Self::default();
        state.port.store(port, Ordering::Relaxed);
        state
    }

    pub(crate) fn record_spans(&self, n: usize) {
        self.spans.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_logs(&self, n: usize) {
        self.logs.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_metrics(&self, n: usize) {
        self.metrics.fetch_add(n as u64, Ordering::Relaxed);
    }

    fn set_listening(&self, addr: SocketAddr) {
        *lock(&self.listen_address) = Some(addr.to_string());
        *lock(&self.last_error) = None;
        self.running.store(true, Ordering::Release);
    }

    fn set_error(&self, error: &ReceiverError) {
        *lock(&self.last_error) = Some(error.to_string());
    }

    fn set_stopped(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Returns a consistent copy of the state.
    #[must_use]
    pub fn status(&self) -> ReceiverStatus {
        ReceiverStatus {
            running: self.running.load(Ordering::Acquire),
            port: self.port.load(Ordering::Relaxed),
            listen_address: lock(&self.listen_address).clone(),
            last_error: lock(&self.last_error).clone(),
            spans_received: self.spans.load(Ordering::Relaxed),
            logs_received: self.logs.load(Ordering::Relaxed),
            metrics_received: self.metrics.load(Ordering::Relaxed),
        }
    }
}

struct ServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: JoinHandle<Result<(), tonic::transport::Error>>,
}

/// OTLP gRPC receiver exposing the trace, logs and metrics collector services.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use api::grpc::OtlpReceiver;
/// use shared::storage::TelemetryStore;
///
/// # async fn example() -> Result<(), api::grpc::ReceiverError> {
/// let mut receiver = OtlpReceiver::new(Arc::new(TelemetryStore::default()), 4319);
/// let addr = receiver.start().await?;
/// println!("listening on {addr}");
/// receiver.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct OtlpReceiver {
    store: Arc<TelemetryStore>,
    port: u16,
    state: Arc<ReceiverState>,
    server: Option<ServerHandle>,
}

impl OtlpReceiver {
    /// Creates a stopped receiver that will listen on `0.0.0.0:port`.
    ///
    /// Port 0 picks a free port; the chosen address is returned by
    /// [`OtlpReceiver::start`].
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>, port: u16) -> Self {
        Self {
            store,
            port,
            state: Arc::new(ReceiverState::new(port)),
            server: None,
        }
    }

    /// Returns the shared state, for status reporting.
    #[must_use]
    pub fn state(&self) -> Arc<ReceiverState> {
        Arc::clone(&self.state)
    }

    /// Binds the listening socket and starts serving in a background task.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::Bind`] if the port cannot be bound. The error
    /// is also recorded in the receiver status.
    pub async fn start(&mut self) -> Result<SocketAddr, ReceiverError> {
        if self.server.is_some() {
            self.stop().await?;
        }

        let requested = format!("0.0.0.0:{}", self.port);
        let listener = match TcpListener::bind(&requested).await {
            Ok(listener) => listener,
            Err(source) => {
                let error = ReceiverError::Bind {
                    addr: requested,
                    source,
                };
                self.state.set_error(&error);
                return Err(error);
            }
        };
        let addr = listener.local_addr().map_err(|source| ReceiverError::Bind {
            addr: requested,
            source,
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);

        let router = Server::builder()
            .add_service(TraceServiceServer::new(TracesServiceImpl::new(
                Arc::clone(&store),
                Arc::clone(&state),
            )))
            .add_service(LogsServiceServer::new(LogsServiceImpl::new(
                Arc::clone(&store),
                Arc::clone(&state),
            )))
            .add_service(MetricsServiceServer::new(MetricsServiceImpl::new(
                store,
                Arc::clone(&state),
            )));

        self.state.set_listening(addr);
        let join_handle = tokio::spawn(async move {
            let result = router
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "OTLP gRPC receiver failed");
            }
            state.set_stopped();
            result
        });

        self.server = Some(ServerHandle {
            shutdown_tx: Some(shutdown_tx),
            join_handle,
        });
        tracing::info!(%addr, "OTLP gRPC receiver listening");
        Ok(addr)
    }

    /// Returns true while the server task is serving.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.status().running
    }

    /// Signals graceful shutdown and waits for the server task.
    ///
    /// Stopping a receiver that never started is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the server ended with a transport error or the
    /// task panicked.
    pub async fn stop(&mut self) -> Result<(), ReceiverError> {
        let Some(mut server) = self.server.take() else {
            return Ok(());
        };
        if let Some(tx) = server.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let result = server.join_handle.await;
        self.state.set_stopped();
        tracing::info!("OTLP gRPC receiver stopped");

        let outcome = match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ReceiverError::Transport(e)),
            Err(e) => Err(ReceiverError::Task(e)),
        };
        if let Err(ref e) = outcome {
            self.state.set_error(e);
        }
        outcome
    }
}
