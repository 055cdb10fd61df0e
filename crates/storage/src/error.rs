//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong
/// internally. Note that "post not found" is **not** in this list for read
/// paths: `load` returns `Ok(None)` and `delete` is a no-op by contract.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An operation that requires a match could not find the post.
    #[display("post not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The remote host's revision token moved between read and write.
    #[display("revision conflict at `{path}` (expected revision {expected})")]
    Conflict { path: String, expected: String },
    /// Underlying database error.
    #[display("database error")]
    Database,
    /// Database migration error.
    #[display("database migration error")]
    Migration,
    /// A row held bytes that no longer parse as a document.
    #[display("invalid stored data")]
    InvalidData,
    /// The candidate document failed structural validation.
    #[display("document failed validation")]
    InvalidDocument,
    /// A post id that cannot be mapped to a storage path.
    #[display("invalid post id: {_0}")]
    InvalidId(#[error(not(source))] String),
    /// An image url this backend does not recognize.
    #[display("invalid asset url: {_0}")]
    InvalidAssetUrl(#[error(not(source))] String),
    /// Network-related error from a remote host.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Backend-specific error.
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Backend(_) | Self::Conflict { .. })
    }
}
