//! I/O error types.

use crate::reader::EventLoad;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unrecognized header.
    #[error("format error: {0}")]
    Format(#[from] phasespace_beam::Error),

    /// Stream ended inside the header.
    #[error("truncated header: expected {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    /// Stream ended inside a record.
    #[error("truncated record {index}: expected {expected} bytes, got {actual}")]
    TruncatedRecord {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// A load stopped early; the events read so far are kept.
    #[error(transparent)]
    Partial(#[from] Box<PartialLoad>),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] phasespace_core::Error),
}

/// A load that failed part way, with everything decoded before the failure.
#[derive(Error, Debug)]
#[error("{source} ({} events loaded before failure)", .load.events.len())]
pub struct PartialLoad {
    /// Events and counts accumulated before the failure.
    pub load: EventLoad,
    /// The error that stopped the load.
    #[source]
    pub source: Error,
}
