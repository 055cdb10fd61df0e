//! Storage backends for scribe documents.
//!
//! Every backend implements the [`StorageAdapter`] capability contract
//! (`save`/`load`/`list`/`delete`, plus the optional [`ImageHosting`]
//! capability), so callers can fan one logical operation out to any number
//! of registered backends without caring what sits behind each one.

pub mod adapter;
mod db;
pub mod error;

pub use crate::adapter::{ContentHost, HostAdapter, HostFile, ImageHosting, LocalAdapter, StorageAdapter};
#[cfg(feature = "mock")]
pub use crate::adapter::{InMemoryHost, MemoryAdapter};
pub use crate::db::Database;
use std::sync::Arc;

pub type AdapterHandle = Arc<dyn StorageAdapter + Send + Sync>;
