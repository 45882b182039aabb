//! Directory watcher feeding OTLP JSON exports into the store.
//!
//! The watcher backfills the directory once, then scans it on a fixed tick.
//! A telemetry file whose length differs from the offset the [`FileTailer`]
//! recorded for it is tailed again, so only the appended bytes are read.

use shared::ingest::{BackfillSummary, FileTailer, TailError};
use shared::storage::TelemetryStore;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Default time between directory scans.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Errors raised while starting the watcher.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// The watch directory could not be created or resolved.
    #[error("cannot prepare watch directory {path}: {source}")]
    Io {
        /// The directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The initial backfill could not list the directory.
    #[error("backfill failed: {0}")]
    Backfill(#[from] TailError),
    /// A blocking task panicked.
    #[error("watcher task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

type KnownFiles = HashSet<PathBuf>;

/// Background task tailing every `.json`/`.jsonl` file of one directory.
pub struct TelemetryWatcher {
    dir: PathBuf,
    tailer: Arc<FileTailer>,
    backfill: BackfillSummary,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl TelemetryWatcher {
    /// Creates the directory if needed, backfills it and starts scanning.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or listed.
    pub async fn start(
        store: Arc<TelemetryStore>,
        dir: impl AsRef<Path>,
        poll_interval: Duration,
    ) -> Result<Self, WatcherError> {
        let requested = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&requested)
            .await
            .map_err(|source| WatcherError::Io {
                path: requested.clone(),
                source,
            })?;
        let dir = tokio::fs::canonicalize(&requested)
            .await
            .map_err(|source| WatcherError::Io {
                path: requested,
                source,
            })?;

        let tailer = Arc::new(FileTailer::new(store));
        let (backfill, known) = {
            let tailer = Arc::clone(&tailer);
            let dir = dir.clone();
            tokio::task::spawn_blocking(move || {
                let summary = tailer.backfill(&dir)?;
                let known = known_files(&dir);
                Ok::<_, TailError>((summary, known))
            })
            .await??
        };

        tracing::info!(
            dir = %dir.display(),
            files = backfill.files,
            failed = backfill.failed_files,
            spans = backfill.totals.spans,
            logs = backfill.totals.logs,
            metrics = backfill.totals.metrics,
            "Backfilled telemetry directory"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join_handle = tokio::spawn(scan_loop(
            Arc::clone(&tailer),
            dir.clone(),
            known,
            poll_interval,
            shutdown_rx,
        ));

        Ok(Self {
            dir,
            tailer,
            backfill,
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(join_handle),
        })
    }

    /// The resolved directory being watched.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The tailer holding per-file offsets.
    #[must_use]
    pub fn tailer(&self) -> &Arc<FileTailer> {
        &self.tailer
    }

    /// What the initial backfill ingested.
    #[must_use]
    pub fn backfill_summary(&self) -> &BackfillSummary {
        &self.backfill
    }

    /// Returns true while the scan task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the scan task to stop and waits for it.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.join_handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Telemetry watcher task failed");
            }
        }
        tracing::info!(dir = %self.dir.display(), "Telemetry watcher stopped");
    }
}

async fn scan_loop(
    tailer: Arc<FileTailer>,
    dir: PathBuf,
    mut known: KnownFiles,
    poll_interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let tailer = Arc::clone(&tailer);
                let dir = dir.clone();
                match tokio::task::spawn_blocking(move || scan(&tailer, &dir, known)).await {
                    Ok(next) => known = next,
                    Err(e) => {
                        tracing::error!(error = %e, "Directory scan panicked");
                        break;
                    }
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!(dir = %dir.display(), "Shutdown signal received");
                break;
            }
        }
    }
}

fn telemetry_files(dir: &Path) -> Vec<(PathBuf, u64)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| FileTailer::is_telemetry_file(path))
        .filter_map(|path| {
            let len = std::fs::metadata(&path).ok()?.len();
            Some((path, len))
        })
        .collect()
}

fn known_files(dir: &Path) -> KnownFiles {
    telemetry_files(dir).into_iter().map(|(path, _)| path).collect()
}

/// One pass over the directory. A file is tailed when its length differs
/// from the tailer's recorded offset; a failed tail leaves the offset alone,
/// so the next pass retries it.
fn scan(tailer: &FileTailer, dir: &Path, previous: KnownFiles) -> KnownFiles {
    let mut next = KnownFiles::with_capacity(previous.len());

    for (path, len) in telemetry_files(dir) {
        if tailer.offset(&path) != Some(len) {
            match tailer.tail(&path) {
                Ok(outcome) => {
                    if outcome.records() > 0 || outcome.skipped_lines > 0 {
                        tracing::info!(
                            path = %path.display(),
                            spans = outcome.spans,
                            logs = outcome.logs,
                            metrics = outcome.metrics,
                            skipped = outcome.skipped_lines,
                            "Ingested telemetry"
                        );
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to tail telemetry file"),
            }
        }
        next.insert(path);
    }

    for path in previous.iter().filter(|p| !next.contains(*p)) {
        if !path.exists() {
            tailer.forget(path);
            tracing::debug!(path = %path.display(), "Telemetry file removed");
        }
    }

    next
}
