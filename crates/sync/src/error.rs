//! Sync Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::report::SyncReport;
use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A mutating operation was requested while another is in flight.
    #[display("another synchronisation operation is already in progress")]
    SyncInProgress,
    /// A fan-out completed with at least one adapter failing; the report
    /// carries every per-adapter outcome, including the successes.
    #[display("{_0}")]
    Fanout(#[error(not(source))] SyncReport),
    /// An image operation was requested but no adapter hosts images.
    #[display("no registered adapter provides image hosting")]
    NoImageHosting,
    /// A manager cannot be built without at least one adapter.
    #[display("no storage adapters registered")]
    NoAdapters,
    /// A single adapter failed outside a fan-out.
    #[display("storage adapter `{_0}` failed")]
    Adapter(#[error(not(source))] String),
    /// The auto-save slot exists but cannot be read back.
    #[display("auto-save slot is corrupt: {_0}")]
    Slot(#[error(not(source))] String),
    /// Packaging the document failed.
    #[display("packaging failed")]
    Package,
    /// An export name that could escape the target directory.
    #[display("invalid export name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// A configured host backend without a matching content host.
    #[display("no content host provided for backend `{_0}`")]
    UnknownHost(#[error(not(source))] String),
    /// The configuration handed to bootstrap failed validation.
    #[display("invalid configuration")]
    Config,
    /// Underlying I/O error.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// A registry or slot record failed to serialize.
    #[display("JSON error: {_0}")]
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
        matches!(self, Self::SyncInProgress | Self::Fanout(_) | Self::Adapter(_) | Self::Io(_))
    }
}
