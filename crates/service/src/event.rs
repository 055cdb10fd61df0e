//! The storage event protocol spoken over the bus.

use crate::bus::BusEvent;
use scribe_model::Post;

/// Storage requests a frontend publishes on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageEvent {
    /// Persist a document to every registered adapter.
    Save(Post),
    /// Load one document into the observable state.
    Load { id: String },
    /// Delete a document from every registered adapter.
    Delete { id: String },
    /// Refresh the observable state from every adapter.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageEventKind {
    Save,
    Load,
    Delete,
    List,
}

impl BusEvent for StorageEvent {
    type Kind = StorageEventKind;

    fn kind(&self) -> StorageEventKind {
        match self {
            Self::Save(_) => StorageEventKind::Save,
            Self::Load { .. } => StorageEventKind::Load,
            Self::Delete { .. } => StorageEventKind::Delete,
            Self::List => StorageEventKind::List,
        }
    }
}
