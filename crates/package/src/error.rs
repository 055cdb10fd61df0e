//! Package Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A package error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// A malformed archive is a hard failure; an individual asset that fails to
/// resolve during encode is *not* — the codec degrades to keeping the
/// original URL, so no asset variant appears here for that case.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A required root entry is absent from the archive.
    #[display("package is missing `{_0}`")]
    MissingEntry(#[error(not(source))] &'static str),
    /// The archive itself could not be read.
    #[display("malformed package archive")]
    Malformed,
    /// An entry or handle name that could escape the cache namespace.
    #[display("invalid asset name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// A cache handle whose namespace or file is absent.
    #[display("cached asset not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The packaged document failed structural validation.
    #[display("package document is invalid")]
    Document,
    /// Remote asset resolution was requested but no fetcher is configured.
    #[display("no fetcher available for remote asset: {_0}")]
    FetchUnavailable(#[error(not(source))] String),
    /// The fetcher could not retrieve a remote asset.
    #[display("failed to fetch remote asset: {_0}")]
    Fetch(#[error(not(source))] String),
    /// Underlying I/O error.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Serialization of a package entry failed.
    #[display("package JSON error: {_0}")]
    Json(serde_json::Error),
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Fetch(_))
    }
}
