//! Integration tests for the otelwatch API.
//!
//! These tests drive the full router, the gRPC receiver over a real socket
//! and the directory watcher against temporary export files. The test
//! modules live in `integration_tests/`.

mod integration_tests {
    mod analysis_tests;
    mod common;
    mod grpc_tests;
    mod health_tests;
    mod ingest_tests;
    mod logs_tests;
    mod metrics_tests;
    mod traces_tests;
}
