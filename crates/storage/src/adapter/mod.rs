//! Storage adapter trait and implementations.
//!
//! This module defines the [`StorageAdapter`] trait, the uniform contract
//! every document backend implements (local SQLite store, remote content
//! host, in-memory mock). Image hosting is an explicit capability accessor
//! rather than optional methods, so callers can check support without
//! probing.

mod host;
mod local;
#[cfg(feature = "mock")]
mod memory;

pub use self::host::{ContentHost, HostAdapter, HostFile};
#[cfg(feature = "mock")]
pub use self::host::InMemoryHost;
pub use self::local::LocalAdapter;
#[cfg(feature = "mock")]
pub use self::memory::MemoryAdapter;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use scribe_model::{Post, PostSummary};

/// Uniform contract for document storage backends.
///
/// All operations are asynchronous and independently failable. Any backend
/// satisfying this contract may be registered with the storage service or
/// the sync manager.
///
/// # Contract
///
/// - [`save`](Self::save) validates before persisting and is idempotent on
///   re-save of an unchanged document (same id, overwritten content).
/// - [`load`](Self::load) returns `Ok(None)` for "not found" — that case is
///   never an error. Errors mean genuine I/O or validation failure.
/// - [`list`](Self::list) returns minimal projections sorted newest-first.
/// - [`delete`](Self::delete) is a no-op (not an error) when the target
///   does not exist.
///
/// # Examples
///
/// ```no_run
/// use scribe_storage::StorageAdapter;
///
/// async fn latest_title(adapter: &dyn StorageAdapter) -> scribe_storage::error::Result<Option<String>> {
///     let posts = adapter.list().await?;
///     Ok(posts.into_iter().next().map(|p| p.title))
/// }
/// ```
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Name of the configured adapter (taken from the configuration object
    /// key). Used for logging and per-adapter fan-out reports.
    fn name(&self) -> &str;

    /// Persist a document, returning its id.
    async fn save(&self, post: &Post) -> Result<String>;

    /// Load a document by id. `Ok(None)` when the backend has no such post.
    async fn load(&self, id: &str) -> Result<Option<Post>>;

    /// List summaries of every stored document, newest-first.
    async fn list(&self) -> Result<Vec<PostSummary>>;

    /// Delete a document by id. Succeeds even when the id is unknown.
    async fn delete(&self, id: &str) -> Result<()>;

    /// The image hosting capability of this backend, if it has one.
    fn images(&self) -> Option<&dyn ImageHosting> {
        None
    }
}

/// Optional capability: backends that can host binary image assets.
#[async_trait]
pub trait ImageHosting: Send + Sync {
    /// Store an image, returning a URL usable as an asset reference.
    async fn upload_image(&self, filename: &str, data: &[u8]) -> Result<String>;

    /// Remove a previously uploaded image. A URL this backend does not
    /// recognize is ignored, so the call can be fanned out safely.
    async fn delete_image(&self, url: &str) -> Result<()>;
}

/// Post ids end up as path segments and database keys; reject anything
/// that could escape either namespace.
pub(crate) fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(['/', '\\', '\0']) || id == "." || id == ".." {
        exn::bail!(ErrorKind::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("p1")]
    #[case("2024-05-first-post")]
    #[case("a.b.c")]
    fn accepts_plain_ids(#[case] id: &str) {
        assert!(validate_id(id).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case("a\0b")]
    #[case(".")]
    #[case("..")]
    fn rejects_path_like_ids(#[case] id: &str) {
        let err = validate_id(id).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidId(_)));
    }
}
