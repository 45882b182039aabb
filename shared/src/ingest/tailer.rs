//! Offset-tracking reader for growing export files.

use super::chunk::decode_chunk;
use crate::storage::TelemetryStore;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// File extensions picked up by the tailer.
pub const TELEMETRY_EXTENSIONS: [&str; 2] = ["json", "jsonl"];

/// Errors raised while tailing a file.
#[derive(Debug, Error)]
pub enum TailError {
    /// Reading the file or directory failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl TailError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What one tail step read and ingested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TailOutcome {
    /// Bytes consumed past the previous offset.
    pub bytes_read: u64,
    /// Spans added to the store.
    pub spans: usize,
    /// Log records added to the store.
    pub logs: usize,
    /// Metric points added to the store.
    pub metrics: usize,
    /// Non-blank lines that could not be ingested.
    pub skipped_lines: usize,
}

impl TailOutcome {
    /// Total entities added.
    #[must_use]
    pub fn records(&self) -> usize {
        self.spans + self.logs + self.metrics
    }

    fn absorb(&mut self, other: TailOutcome) {
        self.bytes_read += other.bytes_read;
        self.spans += other.spans;
        self.logs += other.logs;
        self.metrics += other.metrics;
        self.skipped_lines += other.skipped_lines;
    }
}

/// Summary of a directory backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    /// Files read successfully.
    pub files: usize,
    /// Files that failed to read.
    pub failed_files: usize,
    /// Combined outcome of every file read.
    pub totals: TailOutcome,
}

/// Reads only newly appended bytes of export files into a [`TelemetryStore`].
///
/// Offsets are keyed by path. One mutex covers offset lookup, the read, the
/// decode and the store append, so concurrent notifications for the same
/// file never ingest a byte range twice.
#[derive(Debug)]
pub struct FileTailer {
    store: Arc<TelemetryStore>,
    offsets: Mutex<HashMap<PathBuf, u64>>,
}

impl FileTailer {
    /// Creates a tailer feeding `store`, with no known offsets.
    #[must_use]
    pub fn new(store: Arc<TelemetryStore>) -> Self {
        Self {
            store,
            offsets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the path has a `.json` or `.jsonl` extension.
    #[must_use]
    pub fn is_telemetry_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TELEMETRY_EXTENSIONS.contains(&ext))
    }

    /// Returns the lowercase file stem used as a signal hint.
    #[must_use]
    pub fn file_hint(path: &Path) -> String {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    fn lock_offsets(&self) -> MutexGuard<'_, HashMap<PathBuf, u64>> {
        self.offsets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the recorded offset for a path.
    #[must_use]
    pub fn offset(&self, path: &Path) -> Option<u64> {
        self.lock_offsets().get(path).copied()
    }

    /// Drops the recorded offset for a path, e.g. after it was removed.
    pub fn forget(&self, path: &Path) {
        self.lock_offsets().remove(path);
    }

    /// Reads everything appended to `path` since the last call and ingests it.
    ///
    /// Reading stops after the last newline. A trailing partial line is left
    /// for a later call, unless it (or the whole unread range) parses as a
    /// JSON document on its own.
    ///
    /// A file shorter than its recorded offset was truncated or replaced and
    /// is read again from the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read. The recorded
    /// offset is left unchanged in that case.
    pub fn tail(&self, path: &Path) -> Result<TailOutcome, TailError> {
        let mut offsets = self.lock_offsets();

        let mut file = File::open(path).map_err(TailError::io(path))?;
        let len = file.metadata().map_err(TailError::io(path))?.len();

        let mut start = offsets.get(path).copied().unwrap_or(0);
        if len < start {
            tracing::warn!(path = %path.display(), previous = start, len, "file shrank, reading from start");
            start = 0;
        }

        file.seek(SeekFrom::Start(start)).map_err(TailError::io(path))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(TailError::io(path))?;

        // An unterminated last line may still be mid-write; it stays for the
        // next call unless it already holds a complete JSON value.
        let consumed = complete_prefix_len(&buf);
        buf.truncate(consumed);
        let bytes_read = consumed as u64;
        offsets.insert(path.to_path_buf(), start + bytes_read);

        let mut outcome = TailOutcome {
            bytes_read,
            ..TailOutcome::default()
        };
        let content = String::from_utf8_lossy(&buf);
        if content.trim().is_empty() {
            return Ok(outcome);
        }

        let decoded = decode_chunk(&content, &Self::file_hint(path));
        let counts = self.store.add_batch(decoded.batch);
        outcome.spans = counts.spans;
        outcome.logs = counts.logs;
        outcome.metrics = counts.metrics;
        outcome.skipped_lines = decoded.skipped_lines;

        tracing::debug!(
            path = %path.display(),
            bytes_read,
            spans = outcome.spans,
            logs = outcome.logs,
            metrics = outcome.metrics,
            skipped = outcome.skipped_lines,
            "tailed telemetry file"
        );
        Ok(outcome)
    }

    /// Ingests every telemetry file currently in `dir`, in file name order.
    ///
    /// Per-file failures are logged and counted; they do not abort the
    /// backfill.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory itself cannot be listed.
    pub fn backfill(&self, dir: &Path) -> Result<BackfillSummary, TailError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(TailError::io(dir))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && Self::is_telemetry_file(path))
            .collect();
        paths.sort();

        let mut summary = BackfillSummary::default();
        for path in paths {
            match self.tail(&path) {
                Ok(outcome) => {
                    summary.files += 1;
                    summary.totals.absorb(outcome);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to backfill telemetry file");
                    summary.failed_files += 1;
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            files = summary.files,
            records = summary.totals.records(),
            "backfilled telemetry directory"
        );
        Ok(summary)
    }
}

/// Length of the prefix of `buf` that is safe to decode now.
fn complete_prefix_len(buf: &[u8]) -> usize {
    let line_end = buf
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let trailing = &buf[line_end..];
    if trailing.is_empty() || is_json_value(trailing) || is_json_value(buf) {
        buf.len()
    } else {
        line_end
    }
}

fn is_json_value(bytes: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(bytes).is_ok()
}
