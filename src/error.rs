//! Error types for the filter.

use thiserror::Error;

/// The result type used throughout oppobloom.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for filter construction.
///
/// Only construction can fail. Lookups and forgets never return errors:
/// a missed identifier is expected behavior, not a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested size was zero or negative.
    #[error("filter cannot have a zero or negative size (requested {requested})")]
    SizeTooSmall {
        /// The size that was requested.
        requested: i64,
    },

    /// The requested size exceeds the configured maximum.
    #[error("size {requested} too large to round to a power of two (maximum {max})")]
    SizeTooLarge {
        /// The size that was requested.
        requested: i64,
        /// The configured maximum filter size.
        max: usize,
    },

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
