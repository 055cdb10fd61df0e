//! Model Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant describes a structural defect in a candidate document.
/// Validation runs before any write, so none of these ever originate from
/// a storage backend.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A required metadata field is empty.
    #[display("required field `{_0}` is empty")]
    EmptyField(#[error(not(source))] &'static str),
    /// A document must contain at least one section.
    #[display("document has no sections")]
    NoSections,
    /// Section ids must be unique within a document.
    #[display("duplicate section id `{_0}`")]
    DuplicateSectionId(#[error(not(source))] String),
    /// A section failed its kind-specific shape check.
    #[display("section `{_0}`: {_1}")]
    Section(#[error(not(source))] String, String),
    /// The hero image reference is present but has no url.
    #[display("hero image has no url")]
    HeroImageUrl,
    /// Candidate bytes were not valid document JSON.
    #[display("malformed document JSON: {_0}")]
    Json(serde_json::Error),
}

impl From<serde_json::Error> for ErrorKind {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
