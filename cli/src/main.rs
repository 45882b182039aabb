//! otelwatch CLI
//!
//! Offline analysis of a directory of OpenTelemetry JSON exports. Every
//! command backfills the directory into a fresh in-memory store and prints
//! its result as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! otelwatch --help
//! otelwatch stats ./telemetry
//! otelwatch report ./telemetry --since-minutes 60
//! otelwatch trace ./telemetry 4bf92f3577b34da6a3ce929d0e0e4736
//! ```

#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::config::retention::{DEFAULT_MAX_LOGS, DEFAULT_MAX_METRICS, DEFAULT_MAX_SPANS};
use shared::config::RetentionConfig;
use shared::ingest::FileTailer;
use shared::query::QueryService;
use shared::storage::TelemetryStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// otelwatch CLI - offline OpenTelemetry export analysis
#[derive(Parser)]
#[command(name = "otelwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum spans kept in memory
    #[arg(long, env = "OTELWATCH_MAX_SPANS", default_value_t = DEFAULT_MAX_SPANS, global = true)]
    max_spans: usize,

    /// Maximum log records kept in memory
    #[arg(long, env = "OTELWATCH_MAX_LOGS", default_value_t = DEFAULT_MAX_LOGS, global = true)]
    max_logs: usize,

    /// Maximum metric points kept in memory
    #[arg(long, env = "OTELWATCH_MAX_METRICS", default_value_t = DEFAULT_MAX_METRICS, global = true)]
    max_metrics: usize,

    /// Print compact instead of pretty JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print store counts, capacities and services
    Stats {
        /// Directory of .json/.jsonl exports
        dir: PathBuf,
    },
    /// Print an incident report
    Report {
        /// Directory of .json/.jsonl exports
        dir: PathBuf,
        /// Analyze the last N minutes
        #[arg(long)]
        since_minutes: Option<i64>,
    },
    /// Print every span of one trace
    Trace {
        /// Directory of .json/.jsonl exports
        dir: PathBuf,
        /// Trace id (hex)
        trace_id: String,
    },
    /// Print the health summary of one service
    Health {
        /// Directory of .json/.jsonl exports
        dir: PathBuf,
        /// Service name
        service: String,
    },
}

impl Cli {
    fn retention(&self) -> Result<RetentionConfig> {
        let config = RetentionConfig::new(self.max_spans, self.max_logs, self.max_metrics);
        config.check().context("invalid store capacities")?;
        Ok(config)
    }
}

/// Backfills `dir` into a new store sized by `retention`.
fn load(dir: &Path, retention: RetentionConfig) -> Result<QueryService> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let store = Arc::new(TelemetryStore::new(retention));
    let summary = FileTailer::new(Arc::clone(&store))
        .backfill(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?;

    tracing::info!(
        files = summary.files,
        failed = summary.failed_files,
        spans = summary.totals.spans,
        logs = summary.totals.logs,
        metrics = summary.totals.metrics,
        skipped = summary.totals.skipped_lines,
        "Loaded telemetry"
    );
    Ok(QueryService::new(store))
}

fn render<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(text)
}

fn run(cli: &Cli) -> Result<String> {
    let retention = cli.retention()?;
    match &cli.command {
        Commands::Stats { dir } => render(&load(dir, retention)?.stats(), cli.compact),
        Commands::Report { dir, since_minutes } => render(
            &load(dir, retention)?.analyze_incident(*since_minutes),
            cli.compact,
        ),
        Commands::Trace { dir, trace_id } => {
            render(&load(dir, retention)?.trace_by_id(trace_id), cli.compact)
        }
        Commands::Health { dir, service } => {
            render(&load(dir, retention)?.service_health(service), cli.compact)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    println!("{}", run(&cli)?);
    Ok(())
}
