//! Structural document validation.
//!
//! Runs at every boundary where external bytes become a [`Post`]: after JSON
//! parsing and before any adapter `save`. Checks shape only — no business
//! rules, no cross-document state.

use crate::error::{ErrorKind, Result};
use crate::post::Post;
use crate::section::{Section, SectionKind};
use std::collections::HashSet;

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        exn::bail!(ErrorKind::EmptyField(field));
    }
    Ok(())
}

fn validate_section(section: &Section) -> Result<()> {
    if section.id.trim().is_empty() {
        exn::bail!(ErrorKind::EmptyField("section.id"));
    }
    if section.kind == SectionKind::Image && section.image_url().is_none() {
        exn::bail!(ErrorKind::Section(section.id.clone(), "image section has no image reference".into()));
    }
    Ok(())
}

pub(crate) fn validate_post(post: &Post) -> Result<()> {
    require("id", &post.id)?;
    require("title", &post.title)?;
    require("author", &post.author)?;
    require("category", &post.category)?;
    require("readTime", &post.read_time)?;
    if post.sections.is_empty() {
        exn::bail!(ErrorKind::NoSections);
    }
    let mut seen = HashSet::with_capacity(post.sections.len());
    for section in &post.sections {
        validate_section(section)?;
        if !seen.insert(section.id.as_str()) {
            exn::bail!(ErrorKind::DuplicateSectionId(section.id.clone()));
        }
    }
    if let Some(hero) = &post.hero_image
        && hero.url.trim().is_empty()
    {
        exn::bail!(ErrorKind::HeroImageUrl);
    }
    Ok(())
}
