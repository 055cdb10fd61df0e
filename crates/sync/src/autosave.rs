//! Single-record auto-save slot.
//!
//! Holds the most recently edited document as an encoded package, written
//! on every save before any adapter is contacted. On load the slot beats
//! every adapter, so an edit that never reached a backend still comes back.

use crate::error::{ErrorKind, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;
use tokio::fs;

/// Archive payloads are stored as a data URI so the slot file stays a
/// plain, self-describing JSON document.
const DATA_URI_PREFIX: &str = "data:application/x-tar;base64,";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotRecord {
    post_id: String,
    #[serde(with = "time::serde::rfc3339")]
    saved_at: OffsetDateTime,
    data: String,
}

/// A decoded slot entry.
#[derive(Debug)]
pub struct AutosaveRecord {
    pub post_id: String,
    pub saved_at: OffsetDateTime,
    pub archive: Vec<u8>,
}

/// One named auto-save record on disk.
///
/// An empty slot (missing file) reads back as `None`; a slot that exists
/// but cannot be decoded is an error, not silently ignored data loss.
#[derive(Debug, Clone)]
pub struct AutosaveSlot {
    path: PathBuf,
}

impl AutosaveSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Overwrite the slot with a freshly encoded package.
    pub async fn store(&self, post_id: &str, archive: &[u8]) -> Result<()> {
        let record = SlotRecord {
            post_id: post_id.to_string(),
            saved_at: OffsetDateTime::now_utc(),
            data: format!("{DATA_URI_PREFIX}{}", BASE64.encode(archive)),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(ErrorKind::Io)?;
        }
        let json = serde_json::to_vec_pretty(&record).map_err(ErrorKind::Json)?;
        fs::write(&self.path, json).await.map_err(ErrorKind::Io)?;
        tracing::debug!(id = post_id, bytes = archive.len(), "wrote auto-save slot");
        Ok(())
    }

    /// Read the slot back, `None` when it has never been written.
    pub async fn load(&self) -> Result<Option<AutosaveRecord>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ErrorKind::Io(e).into()),
        };
        let record: SlotRecord =
            serde_json::from_slice(&raw).or_raise(|| ErrorKind::Slot("unreadable record".to_string()))?;
        let payload = record
            .data
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_raise(|| ErrorKind::Slot("missing data URI prefix".to_string()))?;
        let archive =
            BASE64.decode(payload).or_raise(|| ErrorKind::Slot("undecodable archive payload".to_string()))?;
        Ok(Some(AutosaveRecord { post_id: record.post_id, saved_at: record.saved_at, archive }))
    }

    /// Empty the slot. No-op when already empty.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ErrorKind::Io(e).into()),
        }
    }

    /// Empty the slot when it holds the given document. A slot too corrupt
    /// to inspect is cleared as well; the document it claimed to hold is
    /// being deleted anyway.
    pub async fn clear_if(&self, post_id: &str) -> Result<()> {
        match self.load().await {
            Ok(Some(record)) if record.post_id == post_id => self.clear().await,
            Ok(_) => Ok(()),
            Err(error) => {
                tracing::warn!(%error, "clearing unreadable auto-save slot");
                self.clear().await
            },
        }
    }
}
