//! Document model shared by every scribe crate.
//!
//! A [`Post`] is the editable unit: metadata plus an ordered sequence of
//! [`Section`]s and an optional hero image. The model is purely structural —
//! it carries no storage or rendering concerns — and is validated at every
//! boundary where external bytes become a document.

pub mod asset;
pub mod error;
mod post;
mod section;
mod validate;

pub use crate::asset::AssetRef;
pub use crate::post::{HeroImage, ImagePosition, Post, PostMetadata, PostStatus, PostSummary, sort_newest_first};
pub use crate::section::{ImageDescriptor, Section, SectionKind, SectionMeta};
