//! Remote asset resolution seam.
//!
//! Fetching over HTTP is a host-application concern (a browser shell, a CLI
//! with its own client policy), not part of this core. The codec only sees
//! the [`AssetFetcher`] trait; the default [`NoFetch`] implementation makes
//! every remote asset degrade to its original URL during encode.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;

/// Bytes of a fetched remote asset, with the mime type when the transport
/// reported one.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub data: Vec<u8>,
    pub mime: Option<String>,
}

/// Resolves a remote `http(s)` URL to bytes.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset>;
}

/// Fetcher for environments without network access.
///
/// Always fails, which the codec treats as "keep the original URL" — the
/// encoded package simply references the asset remotely instead of
/// embedding it.
pub struct NoFetch;

#[async_trait]
impl AssetFetcher for NoFetch {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        exn::bail!(ErrorKind::FetchUnavailable(url.to_string()));
    }
}

/// In-memory fetcher for testing: serves only the URLs it was given.
#[cfg(feature = "mock")]
pub struct StaticFetcher {
    assets: std::collections::HashMap<String, Vec<u8>>,
}

#[cfg(feature = "mock")]
impl StaticFetcher {
    pub fn with_assets(assets: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        Self {
            assets: assets.into_iter().map(|(url, data)| (url.into(), data.into())).collect(),
        }
    }
}

#[cfg(feature = "mock")]
#[async_trait]
impl AssetFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        match self.assets.get(url) {
            Some(data) => Ok(FetchedAsset { data: data.clone(), mime: None }),
            None => exn::bail!(ErrorKind::Fetch(format!("no such asset: {url}"))),
        }
    }
}
