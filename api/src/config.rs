//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use shared::config::RetentionConfig;
use shared::config::retention::{DEFAULT_MAX_LOGS, DEFAULT_MAX_METRICS, DEFAULT_MAX_SPANS};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP query API port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default OTLP gRPC receiver port.
pub const DEFAULT_GRPC_PORT: u16 = 4319;
/// Default directory watched for OTLP JSON exports.
pub const DEFAULT_TELEMETRY_DIR: &str = "./telemetry";
/// Default time between scans of the telemetry directory, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `OTELWATCH_HOST`: The host address the HTTP API binds to (default: "0.0.0.0")
/// - `OTELWATCH_PORT`: The HTTP API port (default: 8080)
/// - `OTELWATCH_GRPC_PORT`: The OTLP gRPC receiver port (default: 4319)
/// - `OTELWATCH_TELEMETRY_DIR`: Directory of OTLP JSON exports (default: "./telemetry")
/// - `OTELWATCH_POLL_INTERVAL_MS`: Directory scan period (default: 500)
/// - `OTELWATCH_MAX_SPANS`, `OTELWATCH_MAX_LOGS`, `OTELWATCH_MAX_METRICS`: store capacities
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// The port the OTLP gRPC receiver listens on.
    pub grpc_port: u16,
    /// The directory tailed for OTLP JSON exports.
    pub telemetry_dir: PathBuf,
    /// Time between scans of the telemetry directory.
    pub poll_interval: Duration,
    /// Per-signal store capacities.
    pub retention: RetentionConfig,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("OTELWATCH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let telemetry_dir = std::env::var("OTELWATCH_TELEMETRY_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_TELEMETRY_DIR), PathBuf::from);

        Ok(Self {
            host,
            port: env_or("OTELWATCH_PORT", DEFAULT_PORT)?,
            grpc_port: env_or("OTELWATCH_GRPC_PORT", DEFAULT_GRPC_PORT)?,
            telemetry_dir,
            poll_interval: Duration::from_millis(
                env_or("OTELWATCH_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?.max(1),
            ),
            retention: RetentionConfig::new(
                env_or("OTELWATCH_MAX_SPANS", DEFAULT_MAX_SPANS)?,
                env_or("OTELWATCH_MAX_LOGS", DEFAULT_MAX_LOGS)?,
                env_or("OTELWATCH_MAX_METRICS", DEFAULT_MAX_METRICS)?,
            ),
        })
    }

    /// Returns the socket address for binding the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns an error if the host and port do not form a valid socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            grpc_port: DEFAULT_GRPC_PORT,
            telemetry_dir: PathBuf::from(DEFAULT_TELEMETRY_DIR),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            retention: RetentionConfig::default(),
        }
    }
}
