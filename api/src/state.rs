//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use crate::grpc::{ReceiverState, ReceiverStatus};
use shared::config::RetentionConfig;
use shared::query::QueryService;
use shared::storage::TelemetryStore;
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// Holds the query surface over the one telemetry store and the receiver
/// state reported by the status endpoint.
#[derive(Clone)]
pub struct AppState {
    queries: QueryService,
    receiver: Arc<ReceiverState>,
}

impl AppState {
    /// Creates a new application state over `store`.
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>, receiver: Arc<ReceiverState>) -> Self {
        Self {
            queries: QueryService::new(store),
            receiver,
        }
    }

    /// Creates a new application state with an empty default-sized store and
    /// a receiver that never started.
    ///
    /// This is useful for development and testing.
    #[must_use]
    pub fn with_in_memory_store() -> Self {
        Self::new(
            Arc::new(TelemetryStore::new(RetentionConfig::default())),
            Arc::new(ReceiverState::default()),
        )
    }

    /// Returns the query service.
    #[must_use]
    pub fn queries(&self) -> &QueryService {
        &self.queries
    }

    /// Returns the shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<TelemetryStore> {
        self.queries.store()
    }

    /// Returns a snapshot of the gRPC receiver state.
    #[must_use]
    pub fn receiver_status(&self) -> ReceiverStatus {
        self.receiver.status()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_in_memory_store()
    }
}
