//! In-memory key-value backend

use std::collections::HashMap;

use super::{KeyValueStore, StorageError, StorageResult, StorageStats};

/// Key-value store that lives only as long as the process
///
/// Can be switched to reject writes, which makes persistence failures
/// observable in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    /// Make every subsequent write fail with `StorageError::Rejected`
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::Rejected {
                key: key.to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn stats(&self) -> StorageResult<StorageStats> {
        Ok(StorageStats {
            keys: self.entries.len(),
            ..StorageStats::default()
        })
    }
}
