//! Storage layer
//!
//! Quotes and settings live in a small key-value store, one JSON or plain
//! string value per key.
//!
//! ## Backends
//!
//! - **SqliteStore**: durable, a single `kv` table in `quotebook.db`
//! - **MemoryStore**: process-local; used for session state and in tests

pub mod error;
pub mod memory;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, SCHEMA_VERSION};

use std::path::PathBuf;

/// Key holding the JSON snapshot of the quote list
pub const QUOTES_KEY: &str = "quotes";

/// Key holding the last selected category filter
pub const LAST_CATEGORY_KEY: &str = "lastCategory";

/// Key holding the RFC 3339 time of the last successful sync
pub const LAST_SYNCED_KEY: &str = "lastSyncedAt";

/// Session key holding the last quote shown
pub const LAST_QUOTE_KEY: &str = "lastQuote";

/// A string-to-string persistence backend
///
/// Writes are synchronous: once `set` returns `Ok`, the value is what a
/// subsequent `get` (or a fresh process, for durable backends) observes.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Describe where and how much is stored
    fn stats(&self) -> StorageResult<StorageStats>;
}

/// What a backend holds, for status output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// File backing the store, if any
    pub location: Option<PathBuf>,
    /// Size of that file in bytes
    pub size_bytes: u64,
    /// Schema version recorded by the backend
    pub schema_version: Option<i32>,
    /// Number of stored keys
    pub keys: usize,
}

impl StorageStats {
    /// Size formatted for humans (e.g. "12.0 KB")
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;

        if self.size_bytes >= MB {
            format!("{:.1} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.1} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", self.size_bytes)
        }
    }
}
