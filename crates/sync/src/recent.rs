//! Bounded most-recently-used file registry.

use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;
use tokio::fs;

/// Default number of entries kept.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// One remembered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    pub id: String,
    /// Logical location the entry was opened from; entries are unique by
    /// this field.
    pub path: String,
    /// Human-readable label, usually the document title.
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_accessed: OffsetDateTime,
    /// Optional inline copy of the document, for offline reopening.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RecentEntry {
    /// An entry accessed right now.
    pub fn now(id: impl Into<String>, path: impl Into<String>, name: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            path: path.into(),
            name: name.into(),
            last_modified: now,
            last_accessed: now,
            content: None,
        }
    }
}

/// JSON-file-backed MRU registry, most recently accessed first.
///
/// Touching a path already present replaces its entry; beyond the limit the
/// entry with the oldest `last_accessed` is evicted. A registry file that
/// cannot be parsed is treated as empty rather than blocking every
/// subsequent open.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    path: PathBuf,
    limit: usize,
}

impl RecentFiles {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self { path: path.into(), limit }
    }

    /// Current entries, most recently accessed first.
    pub async fn list(&self) -> Result<Vec<RecentEntry>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ErrorKind::Io(e).into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(entries) => Ok(entries),
            Err(error) => {
                tracing::warn!(%error, "unreadable recent-files registry, starting fresh");
                Ok(Vec::new())
            },
        }
    }

    async fn persist(&self, entries: &[RecentEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(ErrorKind::Io)?;
        }
        let json = serde_json::to_vec_pretty(entries).map_err(ErrorKind::Json)?;
        fs::write(&self.path, json).await.map_err(ErrorKind::Io)?;
        Ok(())
    }

    /// Record an access, deduplicating by path and evicting beyond the
    /// limit.
    pub async fn touch(&self, entry: RecentEntry) -> Result<()> {
        let mut entries = self.list().await?;
        entries.retain(|existing| existing.path != entry.path);
        entries.push(entry);
        entries.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        entries.truncate(self.limit);
        self.persist(&entries).await
    }

    /// Drop every entry for a document id. No-op for an unknown id.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let mut entries = self.list().await?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() != before {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}
