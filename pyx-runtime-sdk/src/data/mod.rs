pub mod in_memory_store;

use crate::model::value::{RawValue, ResourceId};

/// Last-known raw value of every resource the server has pushed this session.
/// Writes replace whole entries; there is no eviction.
pub trait ResourceStore: Send + Sync {
    fn get(&self, id: &str) -> Option<RawValue>;

    /// Overwrites any prior entry, returning it.
    fn put(&self, id: ResourceId, value: RawValue) -> Option<RawValue>;

    fn contains(&self, id: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}
