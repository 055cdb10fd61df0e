//! The post: metadata plus ordered content sections.

use crate::error::Result;
use crate::section::Section;
use crate::validate::validate_post;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

/// Focal point of the hero image, as percentages of the rendered box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePosition {
    pub x: f64,
    pub y: f64,
}
impl Default for ImagePosition {
    fn default() -> Self {
        // Centred unless the editor says otherwise.
        Self { x: 50.0, y: 50.0 }
    }
}

/// Banner image shown above the post content.
///
/// `url` is an asset reference string; see [`AssetRef`](crate::AssetRef)
/// for the schemes it may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroImage {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub position: ImagePosition,
}

/// The editable unit of the system.
///
/// Section order is display order; section ids are unique within a post.
/// Field names serialize camelCase to match the editor's JSON payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Stable opaque identifier, assigned by the editor.
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Human-readable read-time label, e.g. "4 min".
    pub read_time: String,
    pub featured: bool,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<HeroImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// The metadata-only subset of a post, written to `metadata.json` in a
/// package and useful for listings that don't need section content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub read_time: String,
    pub featured: bool,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Minimal projection returned by adapter `list()` operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub status: PostStatus,
}

impl Post {
    /// Structural validation of this post.
    ///
    /// Enforced: non-empty `id`/`title`/`author`/`category`/`read_time`, a
    /// non-empty section list with unique section ids, kind-specific section
    /// shape, and a non-empty hero image url when one is present. No
    /// business-rule cross-checks happen here.
    pub fn validate(&self) -> Result<()> {
        validate_post(self)
    }

    /// Parse a post from JSON bytes and validate it.
    ///
    /// This is the boundary function for anything reading a document from a
    /// storage backend or a package archive.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let post: Post = serde_json::from_slice(bytes).map_err(crate::error::ErrorKind::Json)?;
        post.validate()?;
        Ok(post)
    }

    /// Serialize as pretty-printed JSON, the form stored in `content.json`.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self).map_err(crate::error::ErrorKind::Json)?)
    }

    pub fn metadata(&self) -> PostMetadata {
        PostMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category.clone(),
            read_time: self.read_time.clone(),
            featured: self.featured,
            status: self.status,
            date: self.date,
            background_color: self.background_color.clone(),
        }
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            date: self.date,
            status: self.status,
        }
    }
}

/// Sort summaries newest-first, the order adapters return from `list()`.
pub fn sort_newest_first(summaries: &mut [PostSummary]) {
    summaries.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{Section, SectionKind};
    use time::macros::datetime;

    fn minimal_post() -> Post {
        Post {
            id: "p1".into(),
            title: "Title".into(),
            author: "Author".into(),
            category: "General".into(),
            read_time: "3 min".into(),
            featured: false,
            status: PostStatus::Draft,
            date: datetime!(2024-05-01 12:00 UTC),
            sections: vec![Section {
                id: "s1".into(),
                kind: SectionKind::Text,
                content: "<p>hello</p>".into(),
                meta: None,
            }],
            hero_image: None,
            background_color: None,
        }
    }

    #[test]
    fn json_round_trip() {
        let post = minimal_post();
        let bytes = post.to_pretty_json().unwrap();
        let back = Post::from_json(&bytes).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn camel_case_field_names() {
        let post = minimal_post();
        let json = String::from_utf8(post.to_pretty_json().unwrap()).unwrap();
        assert!(json.contains("\"readTime\""));
        assert!(!json.contains("\"read_time\""));
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = Post::from_json(b"not json").unwrap_err();
        assert!(matches!(&*err, crate::error::ErrorKind::Json(_)));
    }

    #[test]
    fn summaries_sort_newest_first() {
        let mut a = minimal_post();
        a.id = "old".into();
        a.date = datetime!(2023-01-01 00:00 UTC);
        let mut b = minimal_post();
        b.id = "new".into();
        b.date = datetime!(2024-01-01 00:00 UTC);
        let mut summaries = vec![a.summary(), b.summary()];
        sort_newest_first(&mut summaries);
        assert_eq!(summaries[0].id, "new");
        assert_eq!(summaries[1].id, "old");
    }
}
