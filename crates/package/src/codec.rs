//! Package encode/decode.
//!
//! Encoding dereferences every asset the document points at (inline base64,
//! remote URL via the fetcher seam, or temp-cache handle) into an `assets/`
//! folder and rewrites the document to package-relative filenames. Decoding
//! reverses the process through the temp asset cache, so the returned
//! document never carries a dangling package-relative path.

use crate::cache::{AssetHandle, TempAssetCache};
use crate::error::{ErrorKind, Result};
use crate::fetch::AssetFetcher;
use crate::manifest::PackageManifest;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::{OptionExt, ResultExt};
use scribe_model::{AssetRef, Post, SectionKind};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tar::{Archive, Builder, Header};
use uuid::Uuid;

/// Full document, pretty-printed, at the package root.
pub const CONTENT_ENTRY: &str = "content.json";
/// Metadata subset at the package root.
pub const METADATA_ENTRY: &str = "metadata.json";
/// Manifest at the package root.
pub const MANIFEST_ENTRY: &str = "manifest.json";
/// Folder holding the dereferenced binary assets.
pub const ASSETS_DIR: &str = "assets";

/// Result of unpacking a package archive.
#[derive(Debug)]
pub struct DecodedPackage {
    pub post: Post,
    pub manifest: PackageManifest,
    /// Cache handles for every extracted asset.
    pub assets: Vec<AssetHandle>,
}

/// Builds and reads the portable package container.
#[derive(Clone)]
pub struct PackageCodec {
    cache: Arc<TempAssetCache>,
    fetcher: Arc<dyn AssetFetcher>,
}

/// Every mutable asset-reference slot in a document: the hero image plus
/// each image section (descriptor url when present, bare content
/// otherwise).
fn asset_slots(post: &mut Post) -> Vec<&mut String> {
    let mut slots = Vec::new();
    if let Some(hero) = post.hero_image.as_mut() {
        slots.push(&mut hero.url);
    }
    for section in post.sections.iter_mut() {
        if section.kind != SectionKind::Image {
            continue;
        }
        if let Some(image) = section.meta.as_mut().and_then(|m| m.image.as_mut()) {
            slots.push(&mut image.url);
        } else if !section.content.is_empty() {
            slots.push(&mut section.content);
        }
    }
    slots
}

fn generated_name(ext: Option<&str>) -> String {
    format!("{}.{}", Uuid::new_v4(), ext.unwrap_or("bin"))
}

fn append_entry(builder: &mut Builder<Vec<u8>>, path: &str, data: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, data).map_err(ErrorKind::Io)?;
    Ok(())
}

impl PackageCodec {
    pub fn new(cache: Arc<TempAssetCache>, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Resolve one asset reference to bytes plus a generated filename.
    ///
    /// `Ok(None)` means "leave the reference as it is": either it is
    /// already package-relative, or resolution failed in a way the encode
    /// contract degrades on (failed fetch, evicted cache entry, garbage
    /// base64) rather than aborting the whole package.
    async fn resolve(&self, url: &str) -> Result<Option<(String, Vec<u8>)>> {
        let parsed = AssetRef::parse(url);
        match &parsed {
            AssetRef::Data { payload, mime } => match BASE64.decode(payload.as_bytes()) {
                Ok(bytes) => Ok(Some((generated_name(parsed.extension()), bytes))),
                Err(error) => {
                    tracing::warn!(%mime, %error, "undecodable data url, keeping original reference");
                    Ok(None)
                },
            },
            AssetRef::Remote(remote) => match self.fetcher.fetch(remote).await {
                Ok(fetched) => {
                    let mime_ext =
                        fetched.mime.as_deref().and_then(|m| m.split('/').nth(1)).map(str::to_string);
                    let ext = parsed.extension().map(str::to_string).or(mime_ext);
                    Ok(Some((generated_name(ext.as_deref()), fetched.data)))
                },
                Err(error) => {
                    tracing::warn!(url = %remote, %error, "asset fetch failed, keeping original URL");
                    Ok(None)
                },
            },
            AssetRef::Temp { .. } => {
                let Some(handle) = AssetHandle::parse(url) else {
                    return Ok(None);
                };
                match self.cache.get(&handle).await {
                    Ok(bytes) => Ok(Some((generated_name(parsed.extension()), bytes))),
                    Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => {
                        tracing::warn!(handle = %handle, "cached asset missing, keeping original reference");
                        Ok(None)
                    },
                    Err(e) => Err(e),
                }
            },
            AssetRef::Relative(_) => Ok(None),
        }
    }

    /// Build a package archive from a document.
    pub async fn encode(&self, post: &Post) -> Result<Vec<u8>> {
        post.validate().or_raise(|| ErrorKind::Document)?;
        let mut doc = post.clone();
        let mut assets: Vec<(String, Vec<u8>)> = Vec::new();
        for slot in asset_slots(&mut doc) {
            if let Some((filename, data)) = self.resolve(slot).await? {
                *slot = format!("{ASSETS_DIR}/{filename}");
                assets.push((filename, data));
            }
        }
        // Deterministic entry ordering.
        assets.sort_by(|a, b| a.0.cmp(&b.0));
        let manifest = PackageManifest::new(assets.iter().map(|(name, _)| name.clone()).collect());

        let mut builder = Builder::new(Vec::new());
        append_entry(&mut builder, CONTENT_ENTRY, &doc.to_pretty_json().or_raise(|| ErrorKind::Document)?)?;
        let metadata = serde_json::to_vec_pretty(&doc.metadata()).map_err(ErrorKind::Json)?;
        append_entry(&mut builder, METADATA_ENTRY, &metadata)?;
        let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(ErrorKind::Json)?;
        append_entry(&mut builder, MANIFEST_ENTRY, &manifest_json)?;
        for (filename, data) in &assets {
            append_entry(&mut builder, &format!("{ASSETS_DIR}/{filename}"), data)?;
        }
        let bytes = builder.into_inner().map_err(ErrorKind::Io)?;
        tracing::debug!(id = %post.id, assets = assets.len(), size = bytes.len(), "encoded package");
        Ok(bytes)
    }

    /// Unpack a package archive, populating the temp asset cache.
    ///
    /// Clears the cache namespace for the document id before extracting, so
    /// assets from a previous decode of the same document cannot leak into
    /// this one.
    pub async fn decode(&self, bytes: &[u8]) -> Result<DecodedPackage> {
        let mut entries: HashMap<String, Vec<u8>> = HashMap::new();
        let mut archive = Archive::new(bytes);
        for entry in archive.entries().or_raise(|| ErrorKind::Malformed)? {
            let mut entry = entry.or_raise(|| ErrorKind::Malformed)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry
                .path()
                .or_raise(|| ErrorKind::Malformed)?
                .to_string_lossy()
                .trim_start_matches("./")
                .to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(ErrorKind::Io)?;
            entries.insert(path, data);
        }

        let content = entries.get(CONTENT_ENTRY).ok_or_raise(|| ErrorKind::MissingEntry(CONTENT_ENTRY))?;
        let mut post = Post::from_json(content).or_raise(|| ErrorKind::Document)?;

        self.cache.clear_doc(&post.id).await?;

        let prefix = format!("{ASSETS_DIR}/");
        let mut names: Vec<&String> = entries.keys().filter(|k| k.starts_with(&prefix)).collect();
        names.sort();
        let mut rewrites: HashMap<String, String> = HashMap::new();
        let mut handles = Vec::new();
        for name in names {
            let filename = &name[prefix.len()..];
            if filename.contains('/') {
                tracing::warn!(entry = %name, "skipping nested asset entry");
                continue;
            }
            let handle = self.cache.put(&post.id, filename, &entries[name]).await?;
            rewrites.insert(name.clone(), handle.to_string());
            rewrites.insert(filename.to_string(), handle.to_string());
            handles.push(handle);
        }

        for slot in asset_slots(&mut post) {
            if let AssetRef::Relative(path) = AssetRef::parse(slot)
                && let Some(handle) = rewrites.get(&path)
            {
                *slot = handle.clone();
            }
        }

        // Keep the stored version/timestamps when readable, but the asset
        // list is always derived from what the archive actually contained.
        let mut manifest = entries
            .get(MANIFEST_ENTRY)
            .and_then(|raw| serde_json::from_slice::<PackageManifest>(raw).ok())
            .unwrap_or_else(|| PackageManifest::new(Vec::new()));
        manifest.assets = handles.iter().map(|h| h.file().to_string()).collect();
        manifest.assets.sort();

        tracing::debug!(id = %post.id, assets = handles.len(), "decoded package");
        Ok(DecodedPackage { post, manifest, assets: handles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::NoFetch;
    use scribe_model::{HeroImage, ImageDescriptor, ImagePosition, PostStatus, Section, SectionMeta};
    use time::macros::datetime;

    pub(super) fn codec_with(fetcher: Arc<dyn AssetFetcher>) -> (tempfile::TempDir, Arc<TempAssetCache>, PackageCodec) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(TempAssetCache::new(dir.path()).unwrap());
        let codec = PackageCodec::new(cache.clone(), fetcher);
        (dir, cache, codec)
    }

    fn codec() -> (tempfile::TempDir, Arc<TempAssetCache>, PackageCodec) {
        codec_with(Arc::new(NoFetch))
    }

    pub(super) fn post(id: &str) -> Post {
        Post {
            id: id.into(),
            title: "Round trip".into(),
            author: "Author".into(),
            category: "General".into(),
            read_time: "5 min".into(),
            featured: true,
            status: PostStatus::Published,
            date: datetime!(2024-07-04 10:00 UTC),
            sections: vec![Section {
                id: "s1".into(),
                kind: SectionKind::Text,
                content: "<p>exact content</p>".into(),
                meta: None,
            }],
            hero_image: None,
            background_color: Some("#101010".into()),
        }
    }

    // base64 of the bytes b"PNG?" — small but decodable.
    const DATA_URL: &str = "data:image/png;base64,UE5HPw==";

    #[tokio::test]
    async fn round_trip_preserves_metadata_and_content() {
        let (_dir, _cache, codec) = codec();
        let original = post("p1");
        let decoded = codec.decode(&codec.encode(&original).await.unwrap()).await.unwrap();
        assert_eq!(decoded.post, original);
        assert!(decoded.manifest.assets.is_empty());
    }

    #[tokio::test]
    async fn data_url_hero_becomes_temp_handle() {
        let (_dir, cache, codec) = codec();
        let mut original = post("p1");
        original.hero_image = Some(HeroImage {
            url: DATA_URL.into(),
            alt: "hero".into(),
            position: ImagePosition::default(),
        });
        let decoded = codec.decode(&codec.encode(&original).await.unwrap()).await.unwrap();
        let hero = decoded.post.hero_image.unwrap();
        let handle = AssetHandle::parse(&hero.url).expect("hero should be a temp handle");
        assert_eq!(cache.get(&handle).await.unwrap(), b"PNG?");
        assert_eq!(decoded.manifest.assets, vec![handle.file().to_string()]);
    }

    #[tokio::test]
    async fn image_section_descriptor_round_trips() {
        let (_dir, cache, codec) = codec();
        let mut original = post("p1");
        original.sections.push(Section {
            id: "img".into(),
            kind: SectionKind::Image,
            content: String::new(),
            meta: Some(SectionMeta {
                image: Some(ImageDescriptor { url: DATA_URL.into(), alt: Some("pic".into()) }),
                ..Default::default()
            }),
        });
        let decoded = codec.decode(&codec.encode(&original).await.unwrap()).await.unwrap();
        let url = decoded.post.sections[1].image_url().unwrap();
        let handle = AssetHandle::parse(url).expect("descriptor should be a temp handle");
        assert_eq!(cache.get(&handle).await.unwrap(), b"PNG?");
        // Untouched fields survive byte-for-byte.
        assert_eq!(decoded.post.sections[0], original.sections[0]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_original_url() {
        let (_dir, _cache, codec) = codec();
        let mut original = post("p1");
        original.hero_image = Some(HeroImage {
            url: "https://example.com/hero.png".into(),
            alt: String::new(),
            position: ImagePosition::default(),
        });
        let decoded = codec.decode(&codec.encode(&original).await.unwrap()).await.unwrap();
        assert_eq!(decoded.post.hero_image.unwrap().url, "https://example.com/hero.png");
        assert!(decoded.manifest.assets.is_empty());
    }

    #[tokio::test]
    async fn temp_handle_assets_are_repackaged() {
        let (_dir, cache, codec) = codec();
        let stored = cache.put("p1", "cover.png", b"cached-bytes").await.unwrap();
        let mut original = post("p1");
        original.hero_image = Some(HeroImage {
            url: stored.to_string(),
            alt: String::new(),
            position: ImagePosition::default(),
        });
        let encoded = codec.encode(&original).await.unwrap();
        // Decode clears and repopulates the namespace; the new handle must
        // resolve to the same bytes.
        let decoded = codec.decode(&encoded).await.unwrap();
        let handle = AssetHandle::parse(&decoded.post.hero_image.unwrap().url).unwrap();
        assert_eq!(cache.get(&handle).await.unwrap(), b"cached-bytes");
    }

    #[tokio::test]
    async fn decode_clears_stale_namespace_entries() {
        let (_dir, cache, codec) = codec();
        let stale = cache.put("p1", "stale.png", b"old").await.unwrap();
        let encoded = codec.encode(&post("p1")).await.unwrap();
        codec.decode(&encoded).await.unwrap();
        let err = cache.get(&stale).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_content_json_is_a_hard_failure() {
        let (_dir, _cache, codec) = codec();
        let mut builder = Builder::new(Vec::new());
        append_entry(&mut builder, METADATA_ENTRY, b"{}").unwrap();
        let bytes = builder.into_inner().unwrap();
        let err = codec.decode(&bytes).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingEntry(CONTENT_ENTRY)));
    }

    #[tokio::test]
    async fn garbage_archive_is_a_hard_failure() {
        let (_dir, _cache, codec) = codec();
        assert!(codec.decode(b"definitely not a tar archive").await.is_err());
    }

    #[tokio::test]
    async fn manifest_asset_list_is_derived_not_trusted() {
        let (_dir, _cache, codec) = codec();
        let doc = post("p1");
        let mut builder = Builder::new(Vec::new());
        append_entry(&mut builder, CONTENT_ENTRY, &doc.to_pretty_json().unwrap()).unwrap();
        let lying = serde_json::to_vec_pretty(&PackageManifest::new(vec!["ghost.png".into()])).unwrap();
        append_entry(&mut builder, MANIFEST_ENTRY, &lying).unwrap();
        append_entry(&mut builder, "assets/real.png", b"real").unwrap();
        let decoded = codec.decode(&builder.into_inner().unwrap()).await.unwrap();
        assert_eq!(decoded.manifest.assets, vec!["real.png".to_string()]);
    }

    #[tokio::test]
    async fn encode_validates_first() {
        let (_dir, _cache, codec) = codec();
        let mut invalid = post("p1");
        invalid.sections.clear();
        let err = codec.encode(&invalid).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Document));
    }
}

#[cfg(all(test, feature = "mock"))]
mod fetch_tests {
    use super::tests::{codec_with, post};
    use super::*;
    use crate::fetch::StaticFetcher;
    use scribe_model::{HeroImage, ImagePosition};

    #[tokio::test]
    async fn successful_fetch_embeds_the_asset() {
        let fetcher = Arc::new(StaticFetcher::with_assets([("https://example.com/hero.png", b"remote-bytes".as_slice())]));
        let (_dir, cache, codec) = codec_with(fetcher);
        let mut original = post("p1");
        original.hero_image = Some(HeroImage {
            url: "https://example.com/hero.png".into(),
            alt: String::new(),
            position: ImagePosition::default(),
        });
        let decoded = codec.decode(&codec.encode(&original).await.unwrap()).await.unwrap();
        let handle = AssetHandle::parse(&decoded.post.hero_image.unwrap().url).unwrap();
        assert_eq!(cache.get(&handle).await.unwrap(), b"remote-bytes");
    }
}
