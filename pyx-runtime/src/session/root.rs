use std::sync::{Arc, PoisonError, RwLock};

use pyx_runtime_sdk::model::value::ResourceId;

pub type RootCallback = Arc<dyn Fn(ResourceId) + Send + Sync>;

/// Names the resource at the top of the tree. Unknown until the first `root` event.
#[derive(Default)]
pub struct RootPointer {
    current: RwLock<Option<ResourceId>>,
    watcher: RwLock<Option<RootCallback>>,
}

impl RootPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<ResourceId> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores `id` and hands it to the watcher. Returns the id it replaced, if any.
    pub fn set(&self, id: ResourceId) -> Option<ResourceId> {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(id.clone());

        if let Some(watcher) = self.watcher() {
            watcher(id);
        }

        previous
    }

    /// Installs the single root watcher, replacing the previous one. A root that is
    /// already known is delivered immediately.
    pub fn watch(&self, callback: RootCallback) {
        *self.watcher.write().unwrap_or_else(PoisonError::into_inner) = Some(callback.clone());

        if let Some(id) = self.get() {
            callback(id);
        }
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.watcher.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn watcher(&self) -> Option<RootCallback> {
        self.watcher
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
