//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The merged configuration sources could not be read.
    #[display("could not read configuration: {_0}")]
    Figment(figment::Error),
    /// Two backends share a name; fan-out reports would be ambiguous.
    #[display("duplicate backend name: {_0}")]
    DuplicateBackend(#[error(not(source))] String),
    /// A recent-files registry that can hold nothing is a misconfiguration.
    #[display("recent-files limit must be at least 1")]
    ZeroRecentLimit,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
