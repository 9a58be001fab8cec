//! Merging the remote feed into the quote store
//!
//! A sync cycle moves through `Idle -> Fetching -> Merging -> Idle`, or
//! `Idle -> Fetching -> FailedNetwork -> Idle` when the feed is unreachable.
//! Failures are reported as a `SyncOutcome`, never as an error; the next
//! cycle simply tries again.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::source::{HttpSource, RemoteSource};
use crate::config::Config;
use crate::error::{QuoteError, QuoteResult};
use crate::models::{Quote, RemotePost};
use crate::store::QuoteStore;

/// How remote quotes are combined with the local list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Append remote quotes whose text is not present yet
    #[default]
    Additive,
    /// Replace every quote carrying the server tag with the remote list
    ReplaceTagged,
}

impl FromStr for MergePolicy {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "additive" => Ok(MergePolicy::Additive),
            "replace_tagged" => Ok(MergePolicy::ReplaceTagged),
            other => Err(QuoteError::Format(format!(
                "unknown merge policy '{}', expected 'additive' or 'replace_tagged'",
                other
            ))),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Additive => f.write_str("additive"),
            MergePolicy::ReplaceTagged => f.write_str("replace_tagged"),
        }
    }
}

/// Where a sync cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Merging,
    FailedNetwork,
}

/// Result of merging one batch of remote quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The local list changed
    Updated { added: usize, removed: usize },
    /// Nothing new
    NoChange,
}

impl MergeOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, MergeOutcome::Updated { .. })
    }
}

/// Result of a full sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Fetched and merged
    Merged(MergeOutcome),
    /// Fetch or merge failed; the store is unchanged
    Failed(String),
}

impl SyncOutcome {
    /// One-line status message for the user
    pub fn status_line(&self) -> &'static str {
        match self {
            SyncOutcome::Merged(MergeOutcome::Updated { .. }) => {
                "Quotes synced with server and updated!"
            }
            SyncOutcome::Merged(MergeOutcome::NoChange) => "No new updates from server.",
            SyncOutcome::Failed(_) => "Server sync failed.",
        }
    }
}

/// Merges fetched remote quotes into a `QuoteStore`
///
/// Cheap to clone; clones share the source and the phase channel, so a
/// clone can fetch on another task while the owner of the store merges.
#[derive(Clone)]
pub struct Reconciler {
    source: Arc<dyn RemoteSource>,
    policy: MergePolicy,
    tag: String,
    phase: Arc<watch::Sender<SyncPhase>>,
}

impl Reconciler {
    /// Create a reconciler for `source`
    pub fn new(source: Arc<dyn RemoteSource>, policy: MergePolicy, tag: impl Into<String>) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            source,
            policy,
            tag: tag.into(),
            phase: Arc::new(phase),
        }
    }

    /// Create a reconciler for the HTTP feed described by `config`
    pub fn from_config(config: &Config) -> QuoteResult<Self> {
        let source = HttpSource::from_config(config)?;
        Ok(Self::new(
            Arc::new(source),
            config.merge_policy,
            config.server_category.clone(),
        ))
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Category assigned to remote quotes
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Where the remote feed lives
    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Current phase
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.phase.send_replace(phase);
    }

    /// Fetch candidate posts from the remote feed
    pub async fn fetch_remote_candidates(&self) -> QuoteResult<Vec<RemotePost>> {
        self.set_phase(SyncPhase::Fetching);
        let result = self.source.fetch().await;
        if let Err(ref e) = result {
            warn!("Remote fetch from {} failed: {}", self.source.describe(), e);
            self.set_phase(SyncPhase::FailedNetwork);
        }
        result
    }

    /// Merge `remote` into `store` under the configured policy
    pub fn reconcile(
        &self,
        store: &mut QuoteStore,
        remote: Vec<RemotePost>,
    ) -> QuoteResult<MergeOutcome> {
        self.set_phase(SyncPhase::Merging);
        let result = self.merge(store, remote);
        self.set_phase(SyncPhase::Idle);
        result
    }

    fn merge(&self, store: &mut QuoteStore, remote: Vec<RemotePost>) -> QuoteResult<MergeOutcome> {
        let incoming: Vec<Quote> = remote
            .iter()
            .filter_map(|post| post.to_quote(&self.tag))
            .collect();
        let skipped = remote.len() - incoming.len();
        if skipped > 0 {
            debug!("Skipped {} remote posts without a title", skipped);
        }

        let outcome = match self.policy {
            MergePolicy::Additive => match store.merge_missing_by_text(incoming)? {
                0 => MergeOutcome::NoChange,
                added => MergeOutcome::Updated { added, removed: 0 },
            },
            MergePolicy::ReplaceTagged => {
                let added = incoming.len();
                let removed = store.replace_category(&self.tag, incoming)?;
                MergeOutcome::Updated { added, removed }
            }
        };

        if let Err(e) = store.mark_synced(Utc::now()) {
            warn!("Could not record sync time: {}", e);
        }
        Ok(outcome)
    }

    /// Finish a cycle whose fetch ran elsewhere (see the poller)
    pub fn complete(
        &self,
        store: &mut QuoteStore,
        fetched: QuoteResult<Vec<RemotePost>>,
    ) -> SyncOutcome {
        let outcome = match fetched {
            Ok(remote) => match self.reconcile(store, remote) {
                Ok(merge) => SyncOutcome::Merged(merge),
                Err(e) => {
                    warn!("Merging remote quotes failed: {}", e);
                    SyncOutcome::Failed(e.to_string())
                }
            },
            Err(e) => SyncOutcome::Failed(e.to_string()),
        };

        match &outcome {
            SyncOutcome::Merged(merge) => info!("Sync complete: {:?}", merge),
            SyncOutcome::Failed(reason) => info!("Sync failed: {}", reason),
        }
        self.set_phase(SyncPhase::Idle);
        outcome
    }

    /// Fetch and merge in one go
    pub async fn sync_once(&self, store: &mut QuoteStore) -> SyncOutcome {
        let fetched = self.fetch_remote_candidates().await;
        self.complete(store, fetched)
    }
}
