//! Observable storage state.

use crate::event::StorageEvent;
use scribe_model::Post;

/// Snapshot of what the storage service knows.
///
/// Mutated only by the service's event handlers;
/// [`StorageService::state`](crate::StorageService::state) hands out clones,
/// never the live value.
#[derive(Debug, Clone, Default)]
pub struct StorageState {
    /// Currently known documents, unique by id.
    pub posts: Vec<Post>,
    /// `true` while an event's handlers are running.
    pub is_loading: bool,
    /// Message of the most recent failure, cleared when the next operation
    /// starts.
    pub error: Option<String>,
    /// The event most recently handled (or being handled).
    pub last_operation: Option<StorageEvent>,
}

impl StorageState {
    /// Insert or replace a post by id, keeping existing order on replace.
    pub(crate) fn upsert(&mut self, post: Post) {
        match self.posts.iter_mut().find(|existing| existing.id == post.id) {
            Some(existing) => *existing = post,
            None => self.posts.push(post),
        }
    }

    pub(crate) fn remove(&mut self, id: &str) {
        self.posts.retain(|post| post.id != id);
    }
}
