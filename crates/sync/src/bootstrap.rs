//! Wire a [`SyncManager`] together from configuration.
//!
//! Local backends are opened directly; host backends only describe a name
//! and endpoint, so the embedding application supplies the matching
//! [`ContentHost`] transport at build time. Remote asset fetching is a
//! collaborator the same way.

use crate::autosave::AutosaveSlot;
use crate::error::{ErrorKind, Result};
use crate::export::DirExport;
use crate::manager::SyncManager;
use crate::recent::RecentFiles;
use exn::{OptionExt, ResultExt};
use scribe_config::{BackendConfig, Config};
use scribe_package::{AssetFetcher, NoFetch, PackageCodec, TempAssetCache};
use scribe_storage::{AdapterHandle, ContentHost, HostAdapter, LocalAdapter};
use std::collections::HashMap;
use std::sync::Arc;

/// Build a manager from configuration plus runtime collaborators.
pub async fn build(
    config: &Config,
    hosts: &HashMap<String, Arc<dyn ContentHost>>,
    fetcher: Arc<dyn AssetFetcher>,
) -> Result<SyncManager> {
    config.validate().or_raise(|| ErrorKind::Config)?;

    let mut adapters: Vec<AdapterHandle> = Vec::new();
    for backend in &config.backends {
        match backend {
            BackendConfig::Local { name, path } => {
                let adapter = LocalAdapter::open(name.clone(), path)
                    .await
                    .or_raise(|| ErrorKind::Adapter(name.clone()))?;
                tracing::debug!(name = %name, path = %path.display(), "opened local backend");
                adapters.push(Arc::new(adapter));
            },
            BackendConfig::Host { name, endpoint, root } => {
                let host = hosts.get(name).ok_or_raise(|| ErrorKind::UnknownHost(name.clone()))?;
                tracing::debug!(name = %name, endpoint = %endpoint, "attached host backend");
                adapters.push(Arc::new(HostAdapter::new(name.clone(), host.clone(), root.clone())));
            },
        }
    }

    let cache = Arc::new(TempAssetCache::new(&config.temp_dir).or_raise(|| ErrorKind::Package)?);
    let codec = PackageCodec::new(cache.clone(), fetcher);
    let autosave = AutosaveSlot::new(config.data_dir.join(&config.autosave_file));
    let recent = RecentFiles::new(config.data_dir.join(&config.recent_file), config.recent_limit);

    let mut manager = SyncManager::new(adapters, codec, cache, autosave, recent)?;
    if let Some(dir) = &config.export_dir {
        manager = manager.with_export(Arc::new(DirExport::new(dir)));
    }
    Ok(manager)
}

/// Build a manager with no remote collaborators: host backends must not be
/// configured, and remote assets degrade to their original URLs.
pub async fn build_offline(config: &Config) -> Result<SyncManager> {
    build(config, &HashMap::new(), Arc::new(NoFetch)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_model::{Post, PostStatus, Section, SectionKind};
    use time::macros::datetime;

    fn config(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.join("data"),
            temp_dir: dir.join("assets"),
            export_dir: Some(dir.join("exports")),
            autosave_file: "autosave.json".to_string(),
            recent_file: "recent.json".to_string(),
            recent_limit: 10,
            backends: vec![BackendConfig::Local { name: "local".to_string(), path: dir.join("scribe.db") }],
        }
    }

    #[tokio::test]
    async fn builds_a_working_manager_from_local_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        let manager = build_offline(&config(dir.path())).await.unwrap();

        let post = Post {
            id: "p1".into(),
            title: "Bootstrapped".into(),
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
        };
        manager.save(&post).await.unwrap();
        assert_eq!(manager.load("p1").await.unwrap().unwrap().title, "Bootstrapped");
        // Export target received the package.
        assert!(dir.path().join("exports/p1.post.tar").exists());
    }

    #[tokio::test]
    async fn host_backend_without_transport_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.backends.push(BackendConfig::Host {
            name: "cloud".to_string(),
            endpoint: "https://host.example".to_string(),
            root: None,
        });
        let err = build_offline(&config).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownHost(name) if name == "cloud"));
    }
}
