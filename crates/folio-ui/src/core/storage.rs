//! Scoped key-value persistence capability.
//!
//! # Design
//! - Keep the browser's session storage behind a trait so session logic stays DOM-free.
//! - Reads never fail; a missing or unreadable key is simply absent.
//! - Writes can fail (quota, private mode) and report why.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced by storage writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backing store refused the write.
    #[error("failed to write storage key {key}")]
    Write {
        /// Key that could not be written.
        key: String,
        /// Platform-specific detail.
        detail: String,
    },
}

/// Minimal string key-value store.
pub trait KeyValueStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    /// Returns [`StorageError::Write`] when the backing store rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value; missing keys are ignored.
    fn remove(&self, key: &str);
}

/// In-memory store used by tests and non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    read_only: Cell<bool>,
}

impl MemoryStore {
    /// Empty, writable store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects every write, mimicking a full quota.
    #[must_use]
    pub fn read_only() -> Self {
        let store = Self::default();
        store.read_only.set(true);
        store
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.read_only.get() {
            return Err(StorageError::Write {
                key: key.to_string(),
                detail: "store is read-only".to_string(),
            });
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}
