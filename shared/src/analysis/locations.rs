//! Aggregation of spans and logs by source-code location.

use crate::models::{CodeLocation, CodeLocationKey, LogRecord, Span};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Activity observed at one `(filepath, function, line)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeLocationSummary {
    /// Source file path.
    pub filepath: Option<String>,
    /// Function name.
    pub function: Option<String>,
    /// Line number.
    pub lineno: Option<i64>,
    /// Namespace of the first entity seen at this location.
    pub namespace: Option<String>,
    /// Spans and logs recorded here.
    pub count: usize,
    /// How many of them were errors.
    pub error_count: usize,
    /// Services that emitted them, sorted.
    pub services: Vec<String>,
    /// Latest span start or log timestamp.
    pub last_seen: DateTime<Utc>,
}

struct Accumulator {
    namespace: Option<String>,
    count: usize,
    error_count: usize,
    services: BTreeSet<String>,
    last_seen: DateTime<Utc>,
}

impl Accumulator {
    fn record(&mut self, service: &str, is_error: bool, seen: DateTime<Utc>) {
        self.count += 1;
        if is_error {
            self.error_count += 1;
        }
        if !self.services.contains(service) {
            self.services.insert(service.to_string());
        }
        self.last_seen = self.last_seen.max(seen);
    }
}

/// Groups located spans and logs by code location.
///
/// Entities without a code location are ignored. Results are ordered by
/// count descending, ties broken by `(filepath, function, line)`, and cut
/// to `limit`.
#[must_use]
pub fn aggregate_locations(
    spans: &[Arc<Span>],
    logs: &[Arc<LogRecord>],
    limit: usize,
) -> Vec<CodeLocationSummary> {
    let mut groups: HashMap<CodeLocationKey, Accumulator> = HashMap::new();

    let mut observe = |code: &CodeLocation, service: &str, is_error: bool, seen: DateTime<Utc>| {
        groups
            .entry(code.key())
            .or_insert_with(|| Accumulator {
                namespace: code.namespace.clone(),
                count: 0,
                error_count: 0,
                services: BTreeSet::new(),
                last_seen: seen,
            })
            .record(service, is_error, seen);
    };

    for span in spans {
        if let Some(ref code) = span.code {
            observe(code, &span.service, span.is_error(), span.start_time);
        }
    }
    for log in logs {
        if let Some(ref code) = log.code {
            observe(code, &log.service, log.is_error(), log.timestamp);
        }
    }

    let mut summaries: Vec<CodeLocationSummary> = groups
        .into_iter()
        .map(|((filepath, function, lineno), acc)| CodeLocationSummary {
            filepath,
            function,
            lineno,
            namespace: acc.namespace,
            count: acc.count,
            error_count: acc.error_count,
            services: acc.services.into_iter().collect(),
            last_seen: acc.last_seen,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.filepath.cmp(&b.filepath))
            .then_with(|| a.function.cmp(&b.function))
            .then_with(|| a.lineno.cmp(&b.lineno))
    });
    summaries.truncate(limit);
    summaries
}
