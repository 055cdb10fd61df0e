//! Multi-backend synchronisation for scribe documents.
//!
//! The [`SyncManager`] is the façade a frontend talks to: it encodes
//! documents into portable packages, keeps an auto-save slot and a
//! recent-files registry, and fans every operation out across the
//! registered storage adapters, settling all of them before reporting.

mod autosave;
pub mod bootstrap;
pub mod error;
mod export;
mod guard;
mod manager;
mod recent;
mod report;

pub use crate::autosave::{AutosaveRecord, AutosaveSlot};
pub use crate::export::{DirExport, ExportTarget};
pub use crate::manager::{PACKAGE_SUFFIX, SaveReceipt, SyncManager};
pub use crate::recent::{DEFAULT_RECENT_LIMIT, RecentEntry, RecentFiles};
pub use crate::report::{AdapterOutcome, SyncReport};
