//! Storage service: the bus handlers that keep [`StorageState`] current.

use crate::bus::EventBus;
use crate::error::{ErrorKind, Result};
use crate::event::{StorageEvent, StorageEventKind};
use crate::state::StorageState;
use exn::ResultExt;
use futures::future::join_all;
use scribe_model::Post;
use scribe_storage::AdapterHandle;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the observable [`StorageState`] and the handlers that mutate it.
///
/// `attach` registers one handler per [`StorageEventKind`] on the given
/// bus; from then on publishing storage events drives the state. Handlers
/// flag `is_loading` and record `last_operation` before touching any
/// adapter, and clear `is_loading` on every exit path, so subscribers
/// polling the state never see a stale in-flight flag.
pub struct StorageService {
    state: Arc<Mutex<StorageState>>,
}

/// What a successful operation folds into the state.
enum Outcome {
    Saved(Post),
    Loaded(Post),
    Deleted(String),
    Listed(Vec<Post>),
}

fn adapter_error(name: &str) -> impl FnOnce() -> ErrorKind {
    let name = name.to_string();
    move || ErrorKind::Adapter(name)
}

async fn run(event: &StorageEvent, adapters: &[AdapterHandle]) -> Result<Outcome> {
    match event {
        StorageEvent::Save(post) => {
            let results = join_all(adapters.iter().map(|adapter| adapter.save(post))).await;
            for (adapter, result) in adapters.iter().zip(results) {
                result.or_raise(adapter_error(adapter.name()))?;
            }
            Ok(Outcome::Saved(post.clone()))
        },
        StorageEvent::Load { id } => {
            let results = join_all(adapters.iter().map(|adapter| adapter.load(id))).await;
            for (adapter, result) in adapters.iter().zip(results) {
                // First registered adapter holding the id wins.
                if let Some(post) = result.or_raise(adapter_error(adapter.name()))? {
                    return Ok(Outcome::Loaded(post));
                }
            }
            exn::bail!(ErrorKind::NotFound(id.clone()));
        },
        StorageEvent::Delete { id } => {
            let results = join_all(adapters.iter().map(|adapter| adapter.delete(id))).await;
            for (adapter, result) in adapters.iter().zip(results) {
                result.or_raise(adapter_error(adapter.name()))?;
            }
            Ok(Outcome::Deleted(id.clone()))
        },
        StorageEvent::List => {
            // Folding adapter by adapter in registration order means a
            // later adapter's copy of an id replaces an earlier one's.
            let mut merged = StorageState::default();
            for adapter in adapters {
                let summaries = adapter.list().await.or_raise(adapter_error(adapter.name()))?;
                let loads = join_all(summaries.iter().map(|summary| adapter.load(&summary.id))).await;
                for loaded in loads {
                    if let Some(post) = loaded.or_raise(adapter_error(adapter.name()))? {
                        merged.upsert(post);
                    }
                }
            }
            Ok(Outcome::Listed(merged.posts))
        },
    }
}

async fn handle(
    event: StorageEvent,
    state: Arc<Mutex<StorageState>>,
    adapters: Arc<[AdapterHandle]>,
) -> Result<()> {
    {
        let mut state = state.lock().await;
        state.is_loading = true;
        state.error = None;
        state.last_operation = Some(event.clone());
    }

    let result = run(&event, &adapters).await;

    let mut state = state.lock().await;
    state.is_loading = false;
    match result {
        Ok(Outcome::Saved(post)) => state.upsert(post),
        Ok(Outcome::Loaded(post)) => state.posts = vec![post],
        Ok(Outcome::Deleted(id)) => state.remove(&id),
        Ok(Outcome::Listed(posts)) => state.posts = posts,
        Err(error) => {
            state.error = Some(error.to_string());
            return Err(error);
        },
    }
    Ok(())
}

impl StorageService {
    /// Register the storage handlers on a bus.
    pub async fn attach(bus: &EventBus<StorageEvent>, adapters: Vec<AdapterHandle>) -> Self {
        let state = Arc::new(Mutex::new(StorageState::default()));
        let adapters: Arc<[AdapterHandle]> = adapters.into();
        for kind in
            [StorageEventKind::Save, StorageEventKind::Load, StorageEventKind::Delete, StorageEventKind::List]
        {
            let state = state.clone();
            let adapters = adapters.clone();
            bus.subscribe(kind, move |event| handle(event, state.clone(), adapters.clone())).await;
        }
        Self { state }
    }

    /// A cloned snapshot of the current state.
    pub async fn state(&self) -> StorageState {
        self.state.lock().await.clone()
    }
}
