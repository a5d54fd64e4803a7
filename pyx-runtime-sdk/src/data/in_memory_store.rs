use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::ResourceStore;
use crate::model::value::{RawValue, ResourceId};

#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<ResourceId, RawValue>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    fn data(&self) -> MutexGuard<'_, HashMap<ResourceId, RawValue>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceStore for InMemoryStore {
    fn get(&self, id: &str) -> Option<RawValue> {
        self.data().get(id).cloned()
    }

    fn put(&self, id: ResourceId, value: RawValue) -> Option<RawValue> {
        self.data().insert(id, value)
    }

    fn contains(&self, id: &str) -> bool {
        self.data().contains_key(id)
    }

    fn len(&self) -> usize {
        self.data().len()
    }

    fn clear(&self) {
        self.data().clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn put_replaces_the_whole_entry() {
        let store = InMemoryStore::new();
        let first = RawValue::try_from(json!({"a": 1, "b": 2})).unwrap();
        let second = RawValue::try_from(json!({"a": 3})).unwrap();

        assert!(store.put("r1".to_string(), first.clone()).is_none());
        assert_eq!(store.put("r1".to_string(), second.clone()), Some(first));
        assert_eq!(store.get("r1"), Some(second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_entries_are_absent() {
        let store = InMemoryStore::new();

        assert!(store.get("nope").is_none());
        assert!(!store.contains("nope"));
        assert!(store.is_empty());
    }
}
