//! Error types for a benchmark run.
//!
//! Every failure is fatal to the run that produced it. There is no retry
//! path, so the variants exist to say *where* the run stopped:
//!
//! - `InvalidConfig`, `MissingHeader`, `InvalidHeader`: rejected before any
//!   request is dispatched.
//! - `Parse`: a malformed input record. Dispatch stops at that record.
//! - `Connect`, `Backend`: the backend failed inside a worker.
//! - `ChannelError`: an internal queue closed unexpectedly.
//! - `RunAborted`: this worker or the dispatcher stopped because something
//!   else in the run failed first.

use crate::backend::BackendError;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the benchmark harness.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A configuration value is out of range.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The input had no rows at all, so the header could not be checked.
    #[error("Input is empty, expected a header row")]
    MissingHeader,

    /// The first row of the input was not the expected header.
    #[error("Expected header starting with `{expected}`, found `{found}`")]
    InvalidHeader {
        expected: &'static str,
        found: String,
    },

    /// A data row could not be read or parsed.
    #[error("Parse error at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    /// A worker could not open its backend session.
    #[error("Worker {worker_id} failed to connect: {source}")]
    Connect {
        worker_id: usize,
        #[source]
        source: BackendError,
    },

    /// A query failed inside a worker.
    #[error("Worker {worker_id} query for `{key}` failed: {source}")]
    Backend {
        worker_id: usize,
        key: String,
        #[source]
        source: BackendError,
    },

    /// Internal channel send/receive failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// Stopped because another part of the run failed.
    #[error("Run aborted")]
    RunAborted,
}

impl Error {
    /// Returns `true` for the secondary error raised by components that were
    /// told to stop, as opposed to the failure that caused the stop.
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::RunAborted)
    }

    /// Maps a CSV read failure to [`Error::Parse`], keeping its line number.
    pub fn from_csv(err: &csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        let reason = match err.kind() {
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => format!("expected {expected_len} fields, found {len}"),
            _ => err.to_string(),
        };
        Self::Parse { line, reason }
    }
}
