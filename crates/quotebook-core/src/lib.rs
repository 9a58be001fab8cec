//! Quotebook Core Library
//!
//! This crate provides the core functionality for Quotebook, a local-first
//! collection of categorized quotes that can pull new entries from a remote
//! feed.
//!
//! # Architecture
//!
//! - **QuoteStore**: Source of truth for the quote list, persisted as a JSON
//!   snapshot in a key-value backend (SQLite on disk)
//! - **Reconciler**: Fetches the remote feed and merges it into the store
//!
//! All queries are served from the in-memory list; every mutation writes the
//! full snapshot back before it becomes visible.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut store = QuoteStore::open(&config)?;
//!
//! store.add("Stay hungry, stay foolish.", "Motivation")?;
//! let life = store.list_by_category(&CategoryFilter::only("Life"));
//!
//! let reconciler = Reconciler::from_config(&config)?;
//! let outcome = reconciler.sync_once(&mut store).await;
//! println!("{}", outcome.status_line());
//! ```
//!
//! # Modules
//!
//! - `store`: Quote list operations (main entry point)
//! - `models`: Quotes, category filters and remote posts
//! - `storage`: Key-value persistence backends
//! - `sync`: Remote feed fetching, merging and scheduling
//! - `transfer`: JSON export and import files
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;
pub mod sync;
pub mod transfer;

pub use config::Config;
pub use error::{QuoteError, QuoteResult};
pub use models::{CategoryFilter, Quote, RemotePost};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StorageError, StorageStats};
pub use store::{InitSource, QuoteStore};
pub use sync::{MergeOutcome, MergePolicy, Reconciler, SyncOutcome};
