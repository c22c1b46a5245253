//! Error types for phasespace-core.

use thiserror::Error;

/// Result type alias for phasespace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for phasespace operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Histogram parameters rejected at construction.
    #[error("invalid histogram configuration: {0}")]
    InvalidHistogramConfig(String),

    /// Bin query outside `[-1, size]`.
    #[error("bin index {index} out of range [-1, {size}]")]
    IndexOutOfRange { index: i64, size: usize },

    /// Two histograms with different binnings cannot be merged.
    #[error("cannot merge histograms with different binning")]
    HistogramMismatch,

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
