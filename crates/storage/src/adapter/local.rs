//! Local transactional storage adapter backed by SQLite.
//!
//! Documents live in the `posts` object store keyed by id (with secondary
//! indexes on date and status); binary image assets live in the `assets`
//! store keyed by generated id and are addressed with `asset://{id}` URLs.

use crate::adapter::{ImageHosting, StorageAdapter, validate_id};
use crate::db::Database;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use scribe_model::{Post, PostStatus, PostSummary, sort_newest_first};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// URL scheme for assets uploaded to the local store.
const ASSET_SCHEME: &str = "asset://";

fn status_str(status: PostStatus) -> &'static str {
    match status {
        PostStatus::Draft => "draft",
        PostStatus::Published => "published",
    }
}

fn status_from_str(raw: &str) -> Result<PostStatus> {
    match raw {
        "draft" => Ok(PostStatus::Draft),
        "published" => Ok(PostStatus::Published),
        _ => exn::bail!(ErrorKind::InvalidData),
    }
}

/// Local filesystem document store.
///
/// # Examples
///
/// ```no_run
/// use scribe_storage::LocalAdapter;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let adapter = LocalAdapter::open("local", "/home/me/.local/share/scribe/posts.db").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    name: String,
    db: Database,
}

impl LocalAdapter {
    /// Wrap an already-connected [`Database`].
    pub fn new(name: impl Into<String>, db: Database) -> Self {
        Self { name: name.into(), db }
    }

    /// Connect to (or create) the database file at `path`.
    pub async fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(name, Database::connect(path).await?))
    }

    /// Raw bytes of an uploaded asset, `None` when the id is unknown or the
    /// URL belongs to another backend.
    pub async fn image_data(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let Some(id) = url.strip_prefix(ASSET_SCHEME) else {
            return Ok(None);
        };
        let row: Option<(Vec<u8>,)> = sqlx::query_as(include_str!("../../queries/select_asset.sql"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(|(data,)| data))
    }
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save(&self, post: &Post) -> Result<String> {
        post.validate().or_raise(|| ErrorKind::InvalidDocument)?;
        validate_id(&post.id)?;
        let content = serde_json::to_string(post).or_raise(|| ErrorKind::InvalidData)?;
        let date = post.date.format(&Rfc3339).or_raise(|| ErrorKind::InvalidData)?;
        sqlx::query(include_str!("../../queries/upsert_post.sql"))
            .bind(&post.id)
            .bind(&post.title)
            .bind(date)
            .bind(status_str(post.status))
            .bind(content)
            .execute(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        tracing::debug!(adapter = %self.name, id = %post.id, "saved post");
        Ok(post.id.clone())
    }

    async fn load(&self, id: &str) -> Result<Option<Post>> {
        validate_id(id)?;
        let row: Option<(String,)> = sqlx::query_as(include_str!("../../queries/select_post.sql"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some((content,)) => {
                let post = Post::from_json(content.as_bytes()).or_raise(|| ErrorKind::InvalidData)?;
                Ok(Some(post))
            },
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<PostSummary>> {
        let rows: Vec<(String, String, String, String)> =
            sqlx::query_as(include_str!("../../queries/list_posts.sql"))
                .fetch_all(self.db.pool())
                .await
                .or_raise(|| ErrorKind::Database)?;
        let mut summaries = Vec::with_capacity(rows.len());
        for (id, title, date, status) in rows {
            let date = OffsetDateTime::parse(&date, &Rfc3339).or_raise(|| ErrorKind::InvalidData)?;
            summaries.push(PostSummary { id, title, date, status: status_from_str(&status)? });
        }
        // The SQL orders by the stored string; re-sort on the parsed
        // timestamp so mixed UTC offsets still come out newest-first.
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        // Deleting an unknown id is a no-op by contract.
        sqlx::query(include_str!("../../queries/delete_post.sql"))
            .bind(id)
            .execute(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    fn images(&self) -> Option<&dyn ImageHosting> {
        Some(self)
    }
}

#[async_trait]
impl ImageHosting for LocalAdapter {
    async fn upload_image(&self, filename: &str, data: &[u8]) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(include_str!("../../queries/insert_asset.sql"))
            .bind(&id)
            .bind(filename)
            .bind(data)
            .execute(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(format!("{ASSET_SCHEME}{id}"))
    }

    async fn delete_image(&self, url: &str) -> Result<()> {
        let Some(id) = url.strip_prefix(ASSET_SCHEME) else {
            // Not ours; another backend in the fan-out may own this URL.
            return Ok(());
        };
        sqlx::query(include_str!("../../queries/delete_asset.sql"))
            .bind(id)
            .execute(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_model::{Section, SectionKind};
    use time::macros::datetime;

    async fn adapter() -> LocalAdapter {
        LocalAdapter::new("local", Database::connect_in_memory().await.unwrap())
    }

    fn post(id: &str, date: OffsetDateTime) -> Post {
        Post {
            id: id.into(),
            title: format!("Title {id}"),
            author: "Author".into(),
            category: "General".into(),
            read_time: "2 min".into(),
            featured: false,
            status: PostStatus::Draft,
            date,
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
    async fn save_and_load_round_trip() {
        let adapter = adapter().await;
        let post = post("p1", datetime!(2024-01-01 00:00 UTC));
        let id = adapter.save(&post).await.unwrap();
        assert_eq!(id, "p1");
        let loaded = adapter.load("p1").await.unwrap().unwrap();
        assert_eq!(loaded, post);
    }

    #[tokio::test]
    async fn resave_overwrites_in_place() {
        let adapter = adapter().await;
        let mut post = post("p1", datetime!(2024-01-01 00:00 UTC));
        adapter.save(&post).await.unwrap();
        post.title = "Edited".into();
        adapter.save(&post).await.unwrap();
        assert_eq!(adapter.list().await.unwrap().len(), 1);
        assert_eq!(adapter.load("p1").await.unwrap().unwrap().title, "Edited");
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let adapter = adapter().await;
        assert!(adapter.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let adapter = adapter().await;
        adapter.save(&post("old", datetime!(2023-06-01 00:00 UTC))).await.unwrap();
        adapter.save(&post("new", datetime!(2024-06-01 00:00 UTC))).await.unwrap();
        let summaries = adapter.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "new");
        assert_eq!(summaries[1].id, "old");
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let adapter = adapter().await;
        adapter.delete("missing-id").await.unwrap();
    }

    #[tokio::test]
    async fn invalid_post_never_reaches_the_database() {
        let adapter = adapter().await;
        let mut bad = post("p1", datetime!(2024-01-01 00:00 UTC));
        bad.sections.clear();
        let err = adapter.save(&bad).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidDocument));
        assert!(adapter.load("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn image_upload_and_delete() {
        let adapter = adapter().await;
        let hosting = adapter.images().unwrap();
        let url = hosting.upload_image("cover.png", b"png-bytes").await.unwrap();
        assert!(url.starts_with("asset://"));
        assert_eq!(adapter.image_data(&url).await.unwrap().unwrap(), b"png-bytes");
        hosting.delete_image(&url).await.unwrap();
        assert!(adapter.image_data(&url).await.unwrap().is_none());
        // Unknown schemes are ignored, deletes can fan out blindly.
        hosting.delete_image("https://elsewhere.example/x.png").await.unwrap();
    }
}
