//! Phase-space format error types.

use crate::Mode;
use thiserror::Error;

/// Result type for phase-space format operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Phase-space format error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Format tag is neither `MODE0` nor `MODE2`.
    #[error("unknown phase-space format tag: {}", String::from_utf8_lossy(.0).escape_debug())]
    UnknownFormat([u8; 5]),

    /// Record slice does not match the record size of its mode.
    #[error("{mode} record needs {expected} bytes, got {actual}")]
    RecordLength {
        mode: Mode,
        expected: usize,
        actual: usize,
    },

    /// Header slice is shorter than the fixed header.
    #[error("header needs {expected} bytes, got {actual}")]
    HeaderLength { expected: usize, actual: usize },
}
