//! Remote feed sync
//!
//! Pulls candidate quotes from a remote feed and merges them into the
//! local `QuoteStore`.
//!
//! ## Usage
//!
//! ```ignore
//! let reconciler = Reconciler::from_config(&config)?;
//!
//! // One cycle, now
//! let outcome = reconciler.sync_once(&mut store).await;
//!
//! // Or on a schedule
//! let mut handle = spawn_sync_poller(reconciler.clone(), config.sync_interval());
//! while let Some(SyncEvent::Fetched(fetched)) = handle.next_event().await {
//!     reconciler.complete(&mut store, fetched);
//! }
//! ```

mod poller;
mod reconciler;
mod source;

pub use poller::{spawn_sync_poller, SyncCommand, SyncEvent, SyncHandle};
pub use reconciler::{MergeOutcome, MergePolicy, Reconciler, SyncOutcome, SyncPhase};
pub use source::{parse_posts, HttpSource, RemoteSource};
