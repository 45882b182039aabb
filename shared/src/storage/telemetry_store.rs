//! Bounded in-memory telemetry store.
//!
//! One mutex guards all three signal sequences and the service registry.
//! Reads copy the `Arc` handles out under the lock and filter/sort the copy
//! afterwards, so queries never hold up ingestion for longer than a clone.

use super::filter::{LogQuery, MetricQuery, SpanQuery};
use crate::config::{DataType, RetentionConfig};
use crate::models::{LogRecord, MetricPoint, Span, TelemetryBatch};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct StoreInner {
    spans: VecDeque<Arc<Span>>,
    logs: VecDeque<Arc<LogRecord>>,
    metrics: VecDeque<Arc<MetricPoint>>,
    services: BTreeSet<String>,
}

/// Appends `item`, evicting from the front until it fits. Returns the
/// number of evicted entries.
fn push_bounded<T>(queue: &mut VecDeque<T>, capacity: usize, item: T) -> usize {
    if capacity == 0 {
        return 0;
    }
    let mut evicted = 0;
    while queue.len() >= capacity {
        queue.pop_front();
        evicted += 1;
    }
    queue.push_back(item);
    evicted
}

/// Counts of entities appended by [`TelemetryStore::add_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    /// Spans appended.
    pub spans: usize,
    /// Log records appended.
    pub logs: usize,
    /// Metric points appended.
    pub metrics: usize,
}

/// Inclusive time window covered by an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Window start.
    pub since: DateTime<Utc>,
    /// Window end.
    pub until: DateTime<Utc>,
}

/// Summary block of an [`ErrorReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    /// Number of error spans in the report.
    pub total_error_spans: usize,
    /// Number of error/fatal log records in the report.
    pub total_error_logs: usize,
    /// Services owning at least one reported error, sorted.
    pub affected_services: Vec<String>,
    /// The window the report covers.
    pub time_range: TimeRange,
}

/// Error spans and error logs within a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Error spans, newest first.
    pub error_spans: Vec<Arc<Span>>,
    /// `ERROR`/`FATAL` log records, newest first.
    pub error_logs: Vec<Arc<LogRecord>>,
    /// Aggregate counts for the lists above.
    pub summary: ErrorSummary,
}

/// Store occupancy and registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Retained spans.
    pub span_count: usize,
    /// Retained log records.
    pub log_count: usize,
    /// Retained metric points.
    pub metric_count: usize,
    /// Configured capacities.
    pub capacity: RetentionConfig,
    /// Every service seen since the last clear, sorted.
    pub services: Vec<String>,
}

/// Thread-safe, fixed-capacity store for spans, logs and metric points.
///
/// Appends never fail: when a sequence is full its oldest entry is evicted.
/// The service registry only grows until [`TelemetryStore::clear`].
///
/// # Example
///
/// ```
/// use shared::config::RetentionConfig;
/// use shared::models::Span;
/// use shared::storage::{SpanQuery, TelemetryStore};
///
/// let store = TelemetryStore::new(RetentionConfig::new(2, 10, 10));
/// for id in ["a", "b", "c"] {
///     store.add_span(Span::new("t1", id, "op", "api"));
/// }
///
/// assert_eq!(store.get_recent_spans(10, &SpanQuery::new()).len(), 2);
/// assert_eq!(store.services(), vec!["api".to_string()]);
/// ```
#[derive(Debug)]
pub struct TelemetryStore {
    config: RetentionConfig,
    inner: Mutex<StoreInner>,
}

impl TelemetryStore {
    /// Creates an empty store with the given capacities.
    #[must_use]
    pub fn new(config: RetentionConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Returns the configured capacities.
    #[must_use]
    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    // The guarded data is valid after any panic, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(inner: &mut StoreInner, service: &str) {
        if !inner.services.contains(service) {
            inner.services.insert(service.to_string());
        }
    }

    /// Appends a span, evicting the oldest span if the store is full.
    pub fn add_span(&self, span: Span) {
        let mut inner = self.lock();
        Self::register(&mut inner, &span.service);
        let evicted = push_bounded(
            &mut inner.spans,
            self.config.capacity(DataType::Traces),
            Arc::new(span),
        );
        if evicted > 0 {
            tracing::trace!(evicted, "span capacity reached, evicted oldest");
        }
    }

    /// Appends a log record, evicting the oldest record if the store is full.
    pub fn add_log(&self, log: LogRecord) {
        let mut inner = self.lock();
        Self::register(&mut inner, &log.service);
        let evicted = push_bounded(
            &mut inner.logs,
            self.config.capacity(DataType::Logs),
            Arc::new(log),
        );
        if evicted > 0 {
            tracing::trace!(evicted, "log capacity reached, evicted oldest");
        }
    }

    /// Appends a metric point, evicting the oldest point if the store is full.
    pub fn add_metric(&self, point: MetricPoint) {
        let mut inner = self.lock();
        Self::register(&mut inner, &point.service);
        let evicted = push_bounded(
            &mut inner.metrics,
            self.config.capacity(DataType::Metrics),
            Arc::new(point),
        );
        if evicted > 0 {
            tracing::trace!(evicted, "metric capacity reached, evicted oldest");
        }
    }

    /// Appends every entity of a batch under a single lock acquisition.
    pub fn add_batch(&self, batch: TelemetryBatch) -> BatchCounts {
        let counts = BatchCounts {
            spans: batch.spans.len(),
            logs: batch.logs.len(),
            metrics: batch.metrics.len(),
        };
        if batch.is_empty() {
            return counts;
        }

        let mut inner = self.lock();
        for span in batch.spans {
            Self::register(&mut inner, &span.service);
            push_bounded(
                &mut inner.spans,
                self.config.capacity(DataType::Traces),
                Arc::new(span),
            );
        }
        for log in batch.logs {
            Self::register(&mut inner, &log.service);
            push_bounded(
                &mut inner.logs,
                self.config.capacity(DataType::Logs),
                Arc::new(log),
            );
        }
        for point in batch.metrics {
            Self::register(&mut inner, &point.service);
            push_bounded(
                &mut inner.metrics,
                self.config.capacity(DataType::Metrics),
                Arc::new(point),
            );
        }
        counts
    }

    /// Returns up to `limit` matching spans, newest start time first.
    #[must_use]
    pub fn get_recent_spans(&self, limit: usize, query: &SpanQuery) -> Vec<Arc<Span>> {
        let snapshot: Vec<Arc<Span>> = self.lock().spans.iter().cloned().collect();
        let mut spans: Vec<_> = snapshot.into_iter().filter(|s| query.matches(s)).collect();
        spans.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        spans.truncate(limit);
        spans
    }

    /// Returns up to `limit` matching log records, newest first.
    #[must_use]
    pub fn get_recent_logs(&self, limit: usize, query: &LogQuery) -> Vec<Arc<LogRecord>> {
        let snapshot: Vec<Arc<LogRecord>> = self.lock().logs.iter().cloned().collect();
        let mut logs: Vec<_> = snapshot.into_iter().filter(|l| query.matches(l)).collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs.truncate(limit);
        logs
    }

    /// Returns up to `limit` matching metric points, newest first.
    #[must_use]
    pub fn get_recent_metrics(&self, limit: usize, query: &MetricQuery) -> Vec<Arc<MetricPoint>> {
        let snapshot: Vec<Arc<MetricPoint>> = self.lock().metrics.iter().cloned().collect();
        let mut points: Vec<_> = snapshot.into_iter().filter(|m| query.matches(m)).collect();
        points.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        points.truncate(limit);
        points
    }

    /// Returns every retained span of a trace, ordered by start time ascending.
    ///
    /// Unknown trace ids yield an empty list.
    #[must_use]
    pub fn get_trace(&self, trace_id: &str) -> Vec<Arc<Span>> {
        let snapshot: Vec<Arc<Span>> = self.lock().spans.iter().cloned().collect();
        let mut spans: Vec<_> = snapshot
            .into_iter()
            .filter(|s| s.trace_id == trace_id)
            .collect();
        spans.sort_by_key(|s| s.start_time);
        spans
    }

    /// Collects error spans and error logs from the last `since_minutes`.
    #[must_use]
    pub fn get_errors(&self, limit: usize, since_minutes: i64) -> ErrorReport {
        self.get_errors_at(limit, since_minutes, Utc::now())
    }

    /// Like [`TelemetryStore::get_errors`] with an explicit window end.
    ///
    /// A window reaching past the earliest representable time starts there.
    #[must_use]
    pub fn get_errors_at(&self, limit: usize, since_minutes: i64, now: DateTime<Utc>) -> ErrorReport {
        let since = Duration::try_minutes(since_minutes)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let error_spans =
            self.get_recent_spans(limit, &SpanQuery::new().errors_only().with_since(since));
        let error_logs =
            self.get_recent_logs(limit, &LogQuery::new().errors_only().with_since(since));

        let affected_services: BTreeSet<String> = error_spans
            .iter()
            .map(|s| s.service.clone())
            .chain(error_logs.iter().map(|l| l.service.clone()))
            .collect();

        ErrorReport {
            summary: ErrorSummary {
                total_error_spans: error_spans.len(),
                total_error_logs: error_logs.len(),
                affected_services: affected_services.into_iter().collect(),
                time_range: TimeRange { since, until: now },
            },
            error_spans,
            error_logs,
        }
    }

    /// Returns counts, capacities and the sorted service registry.
    #[must_use]
    pub fn get_stats(&self) -> StoreStats {
        let inner = self.lock();
        StoreStats {
            span_count: inner.spans.len(),
            log_count: inner.logs.len(),
            metric_count: inner.metrics.len(),
            capacity: self.config.clone(),
            services: inner.services.iter().cloned().collect(),
        }
    }

    /// Returns every service seen since the last clear, sorted.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        self.lock().services.iter().cloned().collect()
    }

    /// Removes every entity and empties the service registry.
    pub fn clear(&self) {
        let mut inner = self.lock();
        *inner = StoreInner::default();
        tracing::info!("telemetry store cleared");
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(RetentionConfig::default())
    }
}
