//! Remote content-host storage adapter.
//!
//! The concrete wire format of the remote host is an external collaborator
//! contract: anything that can create/update/delete/read a file by path
//! with a revision token satisfies [`ContentHost`]. [`HostAdapter`] maps
//! documents onto that contract, always reading before writing so a stale
//! revision token is surfaced as a conflict instead of a blind overwrite.

use crate::adapter::{ImageHosting, StorageAdapter, validate_id};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use scribe_model::{Post, PostSummary, sort_newest_first};
use std::sync::Arc;

/// A versioned file read back from the content host.
#[derive(Debug, Clone)]
pub struct HostFile {
    pub data: Vec<u8>,
    /// Opaque revision token; passed back on write/delete to detect races.
    pub revision: String,
}

/// Minimal contract a remote content host must satisfy.
///
/// Paths are forward-slash relative strings. A missing file is `Ok(None)`
/// on read, never an error.
#[async_trait]
pub trait ContentHost: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<HostFile>>;

    /// Commit file contents. `parent_revision` must be `None` when creating
    /// and the current token when updating; a mismatch is a
    /// [`Conflict`](ErrorKind::Conflict).
    async fn write(&self, path: &str, data: &[u8], parent_revision: Option<&str>) -> Result<String>;

    /// Remove a file at the given revision. Removing a file that is already
    /// gone is a no-op.
    async fn delete(&self, path: &str, revision: &str) -> Result<()>;

    /// Paths of all files under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Storage adapter that persists documents to a remote content host.
///
/// Each post is committed as `posts/{id}.json` (under the configured root,
/// if any). Re-saving an unchanged document is detected by content hash and
/// skipped entirely, keeping `save` idempotent without burning a revision.
///
/// This backend has no [`ImageHosting`] capability: post images stay on
/// whatever host their URLs already point at.
#[derive(Clone)]
pub struct HostAdapter {
    name: String,
    host: Arc<dyn ContentHost>,
    root: Option<String>,
}

impl HostAdapter {
    pub fn new(name: impl Into<String>, host: Arc<dyn ContentHost>, root: Option<String>) -> Self {
        let root = root.map(|r| r.trim_matches('/').to_string()).filter(|r| !r.is_empty());
        Self { name: name.into(), host, root }
    }

    fn prefix(&self) -> String {
        match &self.root {
            Some(root) => format!("{root}/posts/"),
            None => "posts/".to_string(),
        }
    }

    fn post_path(&self, id: &str) -> String {
        format!("{}{id}.json", self.prefix())
    }
}

#[async_trait]
impl StorageAdapter for HostAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save(&self, post: &Post) -> Result<String> {
        post.validate().or_raise(|| ErrorKind::InvalidDocument)?;
        validate_id(&post.id)?;
        let path = self.post_path(&post.id);
        let bytes = post.to_pretty_json().or_raise(|| ErrorKind::InvalidDocument)?;
        // Read-before-write: pick up the current revision token, and skip
        // the commit entirely when the content hash hasn't moved.
        let current = self.host.read(&path).await?;
        if let Some(existing) = &current
            && blake3::hash(&existing.data) == blake3::hash(&bytes)
        {
            tracing::debug!(adapter = %self.name, id = %post.id, "content unchanged, skipping commit");
            return Ok(post.id.clone());
        }
        let revision = self.host.write(&path, &bytes, current.as_ref().map(|f| f.revision.as_str())).await?;
        tracing::debug!(adapter = %self.name, id = %post.id, %revision, "committed post");
        Ok(post.id.clone())
    }

    async fn load(&self, id: &str) -> Result<Option<Post>> {
        validate_id(id)?;
        match self.host.read(&self.post_path(id)).await? {
            Some(file) => {
                let post = Post::from_json(&file.data).or_raise(|| ErrorKind::InvalidData)?;
                Ok(Some(post))
            },
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<PostSummary>> {
        let paths = self.host.list(&self.prefix()).await?;
        let mut summaries = Vec::with_capacity(paths.len());
        for path in paths {
            // A file that vanished between list and read is simply skipped.
            let Some(file) = self.host.read(&path).await? else {
                continue;
            };
            let post = Post::from_json(&file.data).or_raise(|| ErrorKind::InvalidData)?;
            summaries.push(post.summary());
        }
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        let path = self.post_path(id);
        match self.host.read(&path).await? {
            Some(file) => self.host.delete(&path, &file.revision).await,
            // Already gone; the contract says that's fine.
            None => Ok(()),
        }
    }

    fn images(&self) -> Option<&dyn ImageHosting> {
        None
    }
}

/// In-memory content host for testing.
///
/// Tracks a monotonically increasing revision per path and enforces the
/// read-before-write protocol: a write with a stale or missing parent
/// revision fails with [`Conflict`](ErrorKind::Conflict).
#[cfg(feature = "mock")]
pub struct InMemoryHost {
    files: tokio::sync::RwLock<std::collections::HashMap<String, (u64, Vec<u8>)>>,
    counter: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "mock")]
impl InMemoryHost {
    pub fn new() -> Self {
        Self {
            files: tokio::sync::RwLock::new(std::collections::HashMap::new()),
            counter: std::sync::atomic::AtomicU64::new(1),
        }
    }
}

#[cfg(feature = "mock")]
impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "mock")]
#[async_trait]
impl ContentHost for InMemoryHost {
    async fn read(&self, path: &str) -> Result<Option<HostFile>> {
        let guard = self.files.read().await;
        Ok(guard.get(path).map(|(rev, data)| HostFile { data: data.clone(), revision: rev.to_string() }))
    }

    async fn write(&self, path: &str, data: &[u8], parent_revision: Option<&str>) -> Result<String> {
        let mut guard = self.files.write().await;
        let current = guard.get(path).map(|(rev, _)| *rev);
        match (current, parent_revision) {
            (None, None) => {},
            (Some(rev), Some(parent)) if parent == rev.to_string() => {},
            (current, _) => exn::bail!(ErrorKind::Conflict {
                path: path.to_string(),
                expected: current.map(|r| r.to_string()).unwrap_or_else(|| "<none>".to_string()),
            }),
        }
        let next = self.counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        guard.insert(path.to_string(), (next, data.to_vec()));
        Ok(next.to_string())
    }

    async fn delete(&self, path: &str, revision: &str) -> Result<()> {
        let mut guard = self.files.write().await;
        match guard.get(path) {
            Some((rev, _)) if revision == rev.to_string() => {
                guard.remove(path);
                Ok(())
            },
            Some((rev, _)) => exn::bail!(ErrorKind::Conflict {
                path: path.to_string(),
                expected: rev.to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let guard = self.files.read().await;
        let mut paths: Vec<String> = guard.keys().filter(|k| k.starts_with(prefix)).cloned().collect();
        paths.sort();
        Ok(paths)
    }
}
