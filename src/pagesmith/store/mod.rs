//! # Storage Substrate
//!
//! A string-keyed key-value store, the only thing the persistence layer needs.
//! The trait takes `&self` everywhere; backends that mutate use interior
//! mutability since the editor is single-threaded.
//!
//! ## Implementations
//!
//! - [`fs::FsStore`]: one `<key>.json` file per key under a root directory,
//!   written atomically (temp file + rename).
//! - [`memory::MemoryStore`]: in-memory map for tests, with write counting and
//!   simulated failures.
//! - [`fallback::FallbackStore`]: wraps another store and degrades to memory
//!   after the first failure, so a broken disk never blocks editing.

use crate::error::{EditorError, Result};

pub mod fallback;
pub mod fs;
pub mod memory;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Keys become file names, so they are restricted to `[A-Za-z0-9_-]`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(EditorError::Validation(format!(
            "Invalid storage key: '{}'",
            key
        )));
    }
    Ok(())
}
