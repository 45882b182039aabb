//! Decoding of newly appended file content.

use crate::models::TelemetryBatch;
use crate::otlp::json::{decode_document, JsonDecodeError};

/// Result of decoding one chunk of file content.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodedChunk {
    /// Entities decoded from every accepted document.
    pub batch: TelemetryBatch,
    /// Number of JSON documents decoded.
    pub documents: usize,
    /// Number of non-blank lines that could not be ingested.
    pub skipped_lines: usize,
}

fn ingest_document(chunk: &mut DecodedChunk, value: serde_json::Value, hint: &str) -> bool {
    match decode_document(value, hint) {
        Ok(batch) => {
            chunk.documents += 1;
            chunk.batch.extend(batch);
            true
        }
        Err(JsonDecodeError::UnknownSignal) => {
            tracing::debug!(hint, "skipping document with no recognised signal");
            false
        }
        Err(e) => {
            tracing::debug!(hint, error = %e, "skipping malformed OTLP document");
            false
        }
    }
}

/// Decodes a chunk of OTLP JSON text.
///
/// Each non-blank line is parsed as its own document (JSON Lines). When a
/// line does not parse, the whole chunk is tried once as a single document,
/// which covers pretty-printed exports; if that succeeds line processing
/// stops. Lines that fit neither reading are skipped.
#[must_use]
pub fn decode_chunk(content: &str, hint: &str) -> DecodedChunk {
    let mut chunk = DecodedChunk::default();
    let mut whole_tried = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
            if !ingest_document(&mut chunk, value, hint) {
                chunk.skipped_lines += 1;
            }
            continue;
        }

        if !whole_tried {
            whole_tried = true;
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(content) {
                if ingest_document(&mut chunk, value, hint) {
                    return chunk;
                }
            }
        }

        tracing::debug!(preview = %line.chars().take(80).collect::<String>(), "skipping unparseable line");
        chunk.skipped_lines += 1;
    }

    chunk
}
