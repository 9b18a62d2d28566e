use super::{validate_key, KeyValueStore};
use crate::error::{EditorError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-memory store for tests and for degraded sessions.
///
/// Uses `RefCell` for interior mutability since the editor is single-threaded.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
    simulate_write_error: Cell<bool>,
    simulate_read_error: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.set(simulate);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        if self.simulate_read_error.get() {
            return Err(EditorError::StorageUnavailable(
                "Simulated read error".to_string(),
            ));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        if self.simulate_write_error.get() {
            return Err(EditorError::StorageUnavailable(
                "Simulated write error".to_string(),
            ));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        if self.simulate_write_error.get() {
            return Err(EditorError::StorageUnavailable(
                "Simulated write error".to_string(),
            ));
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
