//! File ingestion for OTLP JSON export directories.
//!
//! [`FileTailer`] remembers how far each file has been read and feeds only
//! appended bytes through [`decode_chunk`] into the store. Directory
//! notification lives in the server crate; the tailer itself is synchronous
//! and is also used by the CLI for one-shot backfills.

pub mod chunk;
pub mod tailer;

pub use chunk::{decode_chunk, DecodedChunk};
pub use tailer::{BackfillSummary, FileTailer, TailError, TailOutcome};
