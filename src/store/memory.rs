//! In-memory repository.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::store::{Identify, StoreError};

/// A thread-safe in-memory repository. Clones share the same data.
pub struct Repository<V: Identify> {
    inner: Arc<DashMap<V::Id, V>>,
}

impl<V: Identify> Clone for Repository<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Identify> fmt::Debug for Repository<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository").field("len", &self.inner.len()).finish()
    }
}

impl<V: Identify> Default for Repository<V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }
}

impl<V> Repository<V>
where
    V: Identify + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `value` with the stored value that has the same id.
    pub fn load(&self, value: &mut V) -> Result<(), StoreError> {
        let stored = self.inner.get(&value.id()).ok_or(StoreError::NotFound)?;
        *value = stored.value().clone();
        Ok(())
    }

    /// Store a value under its id.
    pub fn save(&self, value: V) -> Result<(), StoreError> {
        match self.inner.entry(value.id()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
