//! In-memory storage adapter for testing.

use crate::adapter::{ImageHosting, StorageAdapter, validate_id};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use scribe_model::{Post, PostSummary, sort_newest_first};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// URL scheme for images uploaded to the mock adapter.
const MOCK_SCHEME: &str = "mock://";

/// In-memory storage adapter for testing.
///
/// Posts live in a `HashMap` behind a [`RwLock`], so all trait methods can
/// operate on `&self` without external synchronisation. Supports one-shot
/// fault injection via [`fail_next`](Self::fail_next) for fan-out and
/// partial-failure tests.
///
/// # Examples
///
/// ```ignore
/// let adapter = MemoryAdapter::default().with_name("a");
/// adapter.fail_next();
/// assert!(adapter.list().await.is_err()); // injected
/// assert!(adapter.list().await.is_ok());  // flag is one-shot
/// ```
pub struct MemoryAdapter {
    name: String,
    posts: RwLock<HashMap<String, Post>>,
    images: RwLock<HashMap<String, Vec<u8>>>,
    fail_next: AtomicBool,
}

impl MemoryAdapter {
    /// Create a mock adapter pre-populated with posts.
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        Self {
            name: "memory".to_string(),
            posts: RwLock::new(posts.into_iter().map(|p| (p.id.clone(), p)).collect()),
            images: RwLock::new(HashMap::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Change the name of the mock adapter.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make the next operation fail with an injected backend error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of stored posts, for asserting fan-out side effects.
    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }

    fn take_fault(&self) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            exn::bail!(ErrorKind::Backend("injected fault".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::with_posts([])
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save(&self, post: &Post) -> Result<String> {
        self.take_fault()?;
        post.validate().or_raise(|| ErrorKind::InvalidDocument)?;
        validate_id(&post.id)?;
        self.posts.write().await.insert(post.id.clone(), post.clone());
        Ok(post.id.clone())
    }

    async fn load(&self, id: &str) -> Result<Option<Post>> {
        self.take_fault()?;
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<PostSummary>> {
        self.take_fault()?;
        let mut summaries: Vec<PostSummary> = self.posts.read().await.values().map(Post::summary).collect();
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.take_fault()?;
        // No-op when absent, by contract.
        self.posts.write().await.remove(id);
        Ok(())
    }

    fn images(&self) -> Option<&dyn ImageHosting> {
        Some(self)
    }
}

#[async_trait]
impl ImageHosting for MemoryAdapter {
    async fn upload_image(&self, filename: &str, data: &[u8]) -> Result<String> {
        self.take_fault()?;
        let url = format!("{MOCK_SCHEME}{}-{filename}", Uuid::new_v4());
        self.images.write().await.insert(url.clone(), data.to_vec());
        Ok(url)
    }

    async fn delete_image(&self, url: &str) -> Result<()> {
        self.take_fault()?;
        if url.starts_with(MOCK_SCHEME) {
            self.images.write().await.remove(url);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_model::{PostStatus, Section, SectionKind};
    use time::macros::datetime;

    fn post(id: &str) -> Post {
        Post {
            id: id.into(),
            title: format!("Title {id}"),
            author: "Author".into(),
            category: "General".into(),
            read_time: "2 min".into(),
            featured: false,
            status: PostStatus::Draft,
            date: datetime!(2024-02-01 00:00 UTC),
            sections: vec![Section {
                id: "s1".into(),
                kind: SectionKind::Text,
                content: "<p>hi</p>".into(),
                meta: None,
            }],
            hero_image: None,
            background_color: None,
        }
    }

    #[tokio::test]
    async fn save_load_delete() {
        let adapter = MemoryAdapter::default();
        adapter.save(&post("p1")).await.unwrap();
        assert!(adapter.load("p1").await.unwrap().is_some());
        adapter.delete("p1").await.unwrap();
        assert!(adapter.load("p1").await.unwrap().is_none());
        // Deleting again is still fine.
        adapter.delete("p1").await.unwrap();
    }

    #[tokio::test]
    async fn fault_injection_is_one_shot() {
        let adapter = MemoryAdapter::default();
        adapter.fail_next();
        let err = adapter.list().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Backend(_)));
        assert!(adapter.list().await.is_ok());
    }

    #[tokio::test]
    async fn image_hosting_round_trip() {
        let adapter = MemoryAdapter::default();
        let hosting = adapter.images().unwrap();
        let url = hosting.upload_image("a.png", b"bytes").await.unwrap();
        assert!(url.starts_with(MOCK_SCHEME));
        hosting.delete_image(&url).await.unwrap();
        hosting.delete_image("asset://foreign").await.unwrap();
    }
}
