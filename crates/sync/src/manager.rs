//! The synchronisation façade.

use crate::autosave::AutosaveSlot;
use crate::error::{ErrorKind, Result};
use crate::export::ExportTarget;
use crate::guard::InFlight;
use crate::recent::{RecentEntry, RecentFiles};
use crate::report::SyncReport;
use exn::ResultExt;
use futures::future::join_all;
use scribe_model::Post;
use scribe_package::{PackageCodec, TempAssetCache};
use scribe_storage::AdapterHandle;
use std::collections::HashSet;
use std::sync::Arc;

/// File suffix for exported packages.
pub const PACKAGE_SUFFIX: &str = ".post.tar";

/// What a clean save hands back.
#[derive(Debug)]
pub struct SaveReceipt {
    /// Id reported by the first adapter in registration order.
    pub id: String,
    pub report: SyncReport,
}

fn adapter_error(name: &str) -> impl FnOnce() -> ErrorKind {
    let name = name.to_string();
    move || ErrorKind::Adapter(name)
}

/// Coordinates one document store across every registered adapter, the
/// auto-save slot, the recent-files registry, and an optional export
/// target.
///
/// Mutating operations are mutually exclusive: a second caller is rejected
/// with [`ErrorKind::SyncInProgress`] while one is in flight. Reads
/// (`load`, `list`) are not guarded.
///
/// Fan-outs settle completely. When some adapters succeed and some fail,
/// the successes are kept and the caller receives
/// [`ErrorKind::Fanout`] carrying the full per-adapter [`SyncReport`].
pub struct SyncManager {
    adapters: Vec<AdapterHandle>,
    codec: PackageCodec,
    cache: Arc<TempAssetCache>,
    autosave: AutosaveSlot,
    recent: RecentFiles,
    export: Option<Arc<dyn ExportTarget>>,
    busy: InFlight,
}

impl std::fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncManager")
            .field("adapters", &self.adapters.len())
            .field("export", &self.export.is_some())
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}

impl SyncManager {
    pub fn new(
        adapters: Vec<AdapterHandle>,
        codec: PackageCodec,
        cache: Arc<TempAssetCache>,
        autosave: AutosaveSlot,
        recent: RecentFiles,
    ) -> Result<Self> {
        if adapters.is_empty() {
            exn::bail!(ErrorKind::NoAdapters);
        }
        Ok(Self { adapters, codec, cache, autosave, recent, export: None, busy: InFlight::default() })
    }

    pub fn with_export(mut self, target: Arc<dyn ExportTarget>) -> Self {
        self.export = Some(target);
        self
    }

    /// The cache decoded packages hydrate their assets into.
    pub fn asset_cache(&self) -> &Arc<TempAssetCache> {
        &self.cache
    }

    /// The recent-files registry, for frontends rendering an "open recent"
    /// list.
    pub fn recent_files(&self) -> &RecentFiles {
        &self.recent
    }

    async fn touch_recent(&self, post: &Post) -> Result<()> {
        self.recent
            .touch(RecentEntry::now(post.id.clone(), format!("{}{PACKAGE_SUFFIX}", post.id), post.title.clone()))
            .await
    }

    /// Persist a document everywhere.
    ///
    /// The package is encoded once, written to the auto-save slot and the
    /// export target first, then fanned out to every adapter. Validation
    /// happens during encoding, so an invalid document never reaches the
    /// slot or any backend.
    pub async fn save(&self, post: &Post) -> Result<SaveReceipt> {
        let _guard = self.busy.acquire()?;
        let archive = self.codec.encode(post).await.or_raise(|| ErrorKind::Package)?;
        self.autosave.store(&post.id, &archive).await?;
        if let Some(target) = &self.export {
            target.export(&format!("{}{PACKAGE_SUFFIX}", post.id), &archive).await?;
        }

        let results = join_all(self.adapters.iter().map(|adapter| adapter.save(post))).await;
        let mut report = SyncReport::new("save");
        let mut id = None;
        for (adapter, result) in self.adapters.iter().zip(results) {
            match result {
                Ok(saved) => {
                    if id.is_none() {
                        id = Some(saved);
                    }
                    report.record_success(adapter.name());
                },
                Err(error) => report.record_failure(adapter.name(), error.to_string()),
            }
        }
        self.touch_recent(post).await?;

        tracing::debug!(id = %post.id, %report, "save settled");
        match id {
            Some(id) if report.is_clean() => Ok(SaveReceipt { id, report }),
            _ => exn::bail!(ErrorKind::Fanout(report)),
        }
    }

    /// Load a document, auto-save slot first.
    ///
    /// The slot holds the most recent edit even when no adapter ever saw
    /// it, so it takes precedence; adapters are then tried in registration
    /// order.
    pub async fn load(&self, id: &str) -> Result<Option<Post>> {
        if let Some(record) = self.autosave.load().await?
            && record.post_id == id
        {
            let decoded = self.codec.decode(&record.archive).await.or_raise(|| ErrorKind::Package)?;
            if decoded.post.id == id {
                self.touch_recent(&decoded.post).await?;
                return Ok(Some(decoded.post));
            }
        }
        for adapter in &self.adapters {
            if let Some(post) = adapter.load(id).await.or_raise(adapter_error(adapter.name()))? {
                self.touch_recent(&post).await?;
                return Ok(Some(post));
            }
        }
        Ok(None)
    }

    /// Merged view across every adapter, newest first.
    ///
    /// An id held by several adapters appears once, materialized from the
    /// first adapter in registration order that listed it.
    pub async fn list(&self) -> Result<Vec<Post>> {
        let mut seen = HashSet::new();
        let mut posts = Vec::new();
        for adapter in &self.adapters {
            let summaries = adapter.list().await.or_raise(adapter_error(adapter.name()))?;
            let fresh: Vec<_> = summaries.into_iter().filter(|summary| seen.insert(summary.id.clone())).collect();
            let loads = join_all(fresh.iter().map(|summary| adapter.load(&summary.id))).await;
            for loaded in loads {
                if let Some(post) = loaded.or_raise(adapter_error(adapter.name()))? {
                    posts.push(post);
                }
            }
        }
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Delete a document everywhere, including the auto-save slot and the
    /// recent-files registry. Unknown ids are not an error on any adapter.
    pub async fn delete(&self, id: &str) -> Result<SyncReport> {
        let _guard = self.busy.acquire()?;
        let results = join_all(self.adapters.iter().map(|adapter| adapter.delete(id))).await;
        let mut report = SyncReport::new("delete");
        for (adapter, result) in self.adapters.iter().zip(results) {
            match result {
                Ok(()) => report.record_success(adapter.name()),
                Err(error) => report.record_failure(adapter.name(), error.to_string()),
            }
        }
        self.autosave.clear_if(id).await?;
        self.recent.remove(id).await?;

        tracing::debug!(id, %report, "delete settled");
        if report.is_clean() {
            Ok(report)
        } else {
            exn::bail!(ErrorKind::Fanout(report));
        }
    }

    /// Upload an image to every adapter that hosts images.
    ///
    /// Returns the URL minted by the first capable adapter in registration
    /// order.
    pub async fn upload_image(&self, filename: &str, data: &[u8]) -> Result<String> {
        let _guard = self.busy.acquire()?;
        let capable: Vec<_> =
            self.adapters.iter().filter_map(|adapter| adapter.images().map(|images| (adapter.name(), images))).collect();
        if capable.is_empty() {
            exn::bail!(ErrorKind::NoImageHosting);
        }

        let results = join_all(capable.iter().map(|(_, images)| images.upload_image(filename, data))).await;
        let mut report = SyncReport::new("upload image");
        let mut url = None;
        for ((name, _), result) in capable.iter().zip(results) {
            match result {
                Ok(uploaded) => {
                    if url.is_none() {
                        url = Some(uploaded);
                    }
                    report.record_success(name);
                },
                Err(error) => report.record_failure(name, error.to_string()),
            }
        }
        match url {
            Some(url) if report.is_clean() => Ok(url),
            _ => exn::bail!(ErrorKind::Fanout(report)),
        }
    }

    /// Remove an image from every adapter that hosts images.
    pub async fn delete_image(&self, url: &str) -> Result<SyncReport> {
        let _guard = self.busy.acquire()?;
        let capable: Vec<_> =
            self.adapters.iter().filter_map(|adapter| adapter.images().map(|images| (adapter.name(), images))).collect();
        if capable.is_empty() {
            exn::bail!(ErrorKind::NoImageHosting);
        }

        let results = join_all(capable.iter().map(|(_, images)| images.delete_image(url))).await;
        let mut report = SyncReport::new("delete image");
        for ((name, _), result) in capable.iter().zip(results) {
            match result {
                Ok(()) => report.record_success(name),
                Err(error) => report.record_failure(name, error.to_string()),
            }
        }
        if report.is_clean() {
            Ok(report)
        } else {
            exn::bail!(ErrorKind::Fanout(report));
        }
    }

    /// Full resync: re-save every known document to every adapter, so
    /// backends that missed earlier saves catch up.
    pub async fn sync(&self) -> Result<SyncReport> {
        let _guard = self.busy.acquire()?;
        let posts = self.list().await?;
        let mut report = SyncReport::new("sync");
        for post in &posts {
            let results = join_all(self.adapters.iter().map(|adapter| adapter.save(post))).await;
            for (adapter, result) in self.adapters.iter().zip(results) {
                match result {
                    Ok(_) => report.record_success(adapter.name()),
                    Err(error) => report.record_failure(adapter.name(), error.to_string()),
                }
            }
        }
        tracing::debug!(posts = posts.len(), %report, "resync settled");
        if report.is_clean() {
            Ok(report)
        } else {
            exn::bail!(ErrorKind::Fanout(report));
        }
    }
}
