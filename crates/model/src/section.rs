//! Content sections: the ordered blocks that make up a post body.

use serde::{Deserialize, Serialize};

/// What kind of content a section carries.
///
/// The `content` string is interpreted per kind: HTML for text and quote
/// sections, raw source for code, and an asset reference for image sections
/// (which usually carry their descriptor in [`SectionMeta::image`] instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Text,
    Code,
    Quote,
    Image,
}

/// Embedded image descriptor for image sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Kind-specific metadata. All fields optional; the validator checks the
/// combinations that matter (an image section needs an image to show).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Language tag for code sections, e.g. "rust".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Attribution for quote sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDescriptor>,
}

impl SectionMeta {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.language.is_none() && self.author.is_none() && self.image.is_none()
    }
}

/// One ordered block of post content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SectionMeta>,
}

impl Section {
    /// The asset reference this section displays, if any.
    ///
    /// Image sections keep their reference either in the embedded descriptor
    /// or directly in `content`; every other kind has no asset.
    pub fn image_url(&self) -> Option<&str> {
        if self.kind != SectionKind::Image {
            return None;
        }
        if let Some(descriptor) = self.meta.as_ref().and_then(|m| m.image.as_ref()) {
            return Some(&descriptor.url);
        }
        if self.content.is_empty() { None } else { Some(&self.content) }
    }
}
