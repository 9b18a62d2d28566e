use super::memory::MemoryStore;
use super::KeyValueStore;
use crate::error::{EditorError, Result};
use std::cell::Cell;
use tracing::warn;

/// Wraps a primary store. After the first storage failure every call is
/// served from memory for the rest of the session.
pub struct FallbackStore<S> {
    primary: S,
    memory: MemoryStore,
    degraded: Cell<bool>,
}

impl<S: KeyValueStore> FallbackStore<S> {
    pub fn new(primary: S) -> Self {
        Self {
            primary,
            memory: MemoryStore::new(),
            degraded: Cell::new(false),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.get()
    }

    pub fn primary(&self) -> &S {
        &self.primary
    }

    fn degrade(&self, err: &EditorError) {
        if !self.degraded.replace(true) {
            warn!(error = %err, "storage unavailable, keeping data in memory for this session");
        }
    }
}

fn is_storage_failure(err: &EditorError) -> bool {
    matches!(err, EditorError::StorageUnavailable(_) | EditorError::Io(_))
}

impl<S: KeyValueStore> KeyValueStore for FallbackStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.degraded.get() {
            return self.memory.get(key);
        }
        match self.primary.get(key) {
            Err(e) if is_storage_failure(&e) => {
                self.degrade(&e);
                self.memory.get(key)
            }
            other => other,
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.degraded.get() {
            return self.memory.set(key, value);
        }
        match self.primary.set(key, value) {
            Err(e) if is_storage_failure(&e) => {
                self.degrade(&e);
                self.memory.set(key, value)
            }
            other => other,
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.degraded.get() {
            return self.memory.remove(key);
        }
        match self.primary.remove(key) {
            Err(e) if is_storage_failure(&e) => {
                self.degrade(&e);
                self.memory.remove(key)
            }
            other => other,
        }
    }
}
