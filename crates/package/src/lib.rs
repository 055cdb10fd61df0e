//! The portable package container: a tar archive holding `content.json`
//! (the full document), `metadata.json` (the metadata subset),
//! `manifest.json`, and an `assets/` folder of dereferenced binary assets.
//!
//! [`PackageCodec`] turns documents into packages and back; the
//! [`TempAssetCache`] holds extracted binaries between a decode and the
//! next save so a decoded-but-unsaved document can render its images.

pub mod cache;
mod codec;
pub mod error;
pub mod fetch;
mod manifest;

pub use crate::cache::{AssetHandle, TempAssetCache};
pub use crate::codec::{DecodedPackage, PackageCodec};
pub use crate::fetch::{AssetFetcher, FetchedAsset, NoFetch};
#[cfg(feature = "mock")]
pub use crate::fetch::StaticFetcher;
pub use crate::manifest::{FORMAT_VERSION, PackageManifest};
