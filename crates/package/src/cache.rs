//! Temp asset cache: per-document scratch storage for extracted binaries.
//!
//! Entries exist so a decoded-but-not-yet-saved document can render its
//! images without re-extracting the package on every keystroke. They are
//! scratch data — nothing here is guaranteed durable across restarts.

use crate::error::{ErrorKind, Result};
use scribe_model::AssetRef;
use scribe_model::asset::TEMP_SCHEME;
use std::fmt;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A single path component: no separators, no traversal, no null bytes.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
        exn::bail!(ErrorKind::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Reference to one cached asset, usable as an asset URL in a document.
///
/// Formats as `temp://{doc}/{file}` — the string form a decoded document
/// carries in place of its package-relative asset paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    doc: String,
    file: String,
}

impl AssetHandle {
    pub fn new(doc: impl Into<String>, file: impl Into<String>) -> Result<Self> {
        let (doc, file) = (doc.into(), file.into());
        validate_name(&doc)?;
        validate_name(&file)?;
        Ok(Self { doc, file })
    }

    /// Parse a handle back out of an asset reference string.
    pub fn parse(raw: &str) -> Option<Self> {
        match AssetRef::parse(raw) {
            AssetRef::Temp { doc, file } => Self::new(doc, file).ok(),
            _ => None,
        }
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn file(&self) -> &str {
        &self.file
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TEMP_SCHEME}{}/{}", self.doc, self.file)
    }
}

/// Filesystem-backed scratch storage, namespaced by document id.
///
/// Blobs live at `{root}/{doc_id}/{filename}`. The cache is shared across
/// documents but a decode only ever touches its own namespace, so two
/// documents can never clobber each other's assets.
///
/// # Examples
///
/// ```no_run
/// use scribe_package::TempAssetCache;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = TempAssetCache::new("/tmp/scribe-assets")?;
/// let handle = cache.put("post-1", "cover.png", b"bytes").await?;
/// assert_eq!(handle.to_string(), "temp://post-1/cover.png");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TempAssetCache {
    root: PathBuf,
}

impl TempAssetCache {
    /// Create a cache rooted at an absolute directory, creating it if
    /// missing.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidName(root.display().to_string()));
        }
        if !root.exists() {
            // Non-async: happens once at construction.
            sync_create_dir(&root).map_err(ErrorKind::Io)?;
        }
        Ok(Self { root })
    }

    fn entry_path(&self, handle: &AssetHandle) -> PathBuf {
        self.root.join(handle.doc()).join(handle.file())
    }

    /// Store a blob under the document's namespace and return its handle.
    pub async fn put(&self, doc_id: &str, filename: &str, data: &[u8]) -> Result<AssetHandle> {
        let handle = AssetHandle::new(doc_id, filename)?;
        let path = self.entry_path(&handle);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(ErrorKind::Io)?;
        }
        fs::write(&path, data).await.map_err(ErrorKind::Io)?;
        tracing::debug!(doc = doc_id, file = filename, "cached asset");
        Ok(handle)
    }

    /// Resolve a previously stored handle to its bytes.
    pub async fn get(&self, handle: &AssetHandle) -> Result<Vec<u8>> {
        let path = self.entry_path(handle);
        fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => exn::Exn::from(ErrorKind::NotFound(handle.to_string())),
            _ => exn::Exn::from(ErrorKind::Io(e)),
        })
    }

    /// Remove every entry for one document. Called at the start of every
    /// package decode so stale assets from a previous version of the same
    /// document never leak into the new one. No-op for an unknown id.
    pub async fn clear_doc(&self, doc_id: &str) -> Result<()> {
        validate_name(doc_id)?;
        match fs::remove_dir_all(self.root.join(doc_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ErrorKind::Io(e).into()),
        }
    }

    /// Purge everything under the cache root.
    pub async fn clear(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.root).await.map_err(ErrorKind::Io)?;
        while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path).await.map_err(ErrorKind::Io)?;
            } else {
                fs::remove_file(&path).await.map_err(ErrorKind::Io)?;
            }
        }
        Ok(())
    }
}
