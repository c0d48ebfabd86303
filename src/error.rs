//! Error types for the Sarissa query algebra.
//!
//! All fallible operations return [`QueryError`] through the crate-wide
//! [`Result`] alias. Errors are raised while a filter tree is prepared or while
//! a composite iterator is assembled; once a [`DocIterator`] tree starts
//! iterating, `next`/`seek`/`evaluate` no longer fail.
//!
//! # Examples
//!
//! ```
//! use sarissa_query::error::{QueryError, Result};
//!
//! fn validate(boost: f32) -> Result<()> {
//!     if boost.is_nan() {
//!         return Err(QueryError::invalid_filter("boost must be a number"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate(f32::NAN).is_err());
//! ```
//!
//! [`DocIterator`]: crate::query::iterator::DocIterator

use std::io;

use thiserror::Error;

/// The main error type for query preparation and execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Structurally invalid filter tree (missing child, bad boost, ...).
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A sub-iterator exposes a score that disagrees with the prepared order.
    #[error("Score buffer mismatch: expected {expected} bytes, got {actual}")]
    ScoreMismatch { expected: usize, actual: usize },

    /// The requested operation is not supported by the iterator.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Index boundary errors.
    #[error("Index error: {0}")]
    Index(String),

    /// I/O errors (CLI input files, config files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`QueryError`].
pub type Result<T> = std::result::Result<T, QueryError>;

impl QueryError {
    /// Create a new invalid filter error.
    pub fn invalid_filter<S: Into<String>>(msg: S) -> Self {
        QueryError::InvalidFilter(msg.into())
    }

    /// Create a new score mismatch error.
    pub fn score_mismatch(expected: usize, actual: usize) -> Self {
        QueryError::ScoreMismatch { expected, actual }
    }

    /// Create a new not supported error.
    pub fn not_supported<S: Into<String>>(msg: S) -> Self {
        QueryError::NotSupported(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        QueryError::InvalidConfig(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        QueryError::Index(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        QueryError::Other(msg.into())
    }
}
