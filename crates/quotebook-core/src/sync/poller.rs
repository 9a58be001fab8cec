//! Scheduled sync
//!
//! The poller owns the timer and the fetches, never the store. Each tick
//! spawns a fetch whose result is sent back as a `SyncEvent`; the task that
//! owns the `QuoteStore` finishes the cycle with `Reconciler::complete`.
//! User commands handled by that task in the meantime simply run first.
//!
//! Fetches are not serialized: if the feed is slower than the period,
//! several fetches can be in flight and their merges arrive in completion
//! order. In-flight fetches are not cancelled on shutdown.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::reconciler::Reconciler;
use crate::error::QuoteResult;
use crate::models::RemotePost;

/// Commands sent to the poller task
#[derive(Debug)]
pub enum SyncCommand {
    /// Start a fetch right away
    SyncNow,
    /// Stop the schedule
    Shutdown,
}

/// Events from the poller task
#[derive(Debug)]
pub enum SyncEvent {
    /// A fetch finished; merge it into the store
    Fetched(QuoteResult<Vec<RemotePost>>),
}

/// Handle for controlling the background poller
///
/// Dropping the handle stops the schedule.
pub struct SyncHandle {
    command_tx: mpsc::Sender<SyncCommand>,
    event_rx: mpsc::Receiver<SyncEvent>,
}

impl SyncHandle {
    /// Ask for an immediate sync cycle
    ///
    /// Returns false if the poller has already stopped.
    pub async fn trigger(&self) -> bool {
        self.command_tx.send(SyncCommand::SyncNow).await.is_ok()
    }

    /// Stop the schedule
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(SyncCommand::Shutdown).await;
    }

    /// Wait for the next fetched batch
    ///
    /// Returns `None` once the poller has stopped and no fetch is in flight.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.event_rx.recv().await
    }
}

/// Spawn a background task that fetches the remote feed every `period`
///
/// The first scheduled fetch happens one full period after spawning.
pub fn spawn_sync_poller(reconciler: Reconciler, period: Duration) -> SyncHandle {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(64);

    tokio::spawn(sync_poller_task(reconciler, period, command_rx, event_tx));

    SyncHandle {
        command_tx,
        event_rx,
    }
}

async fn sync_poller_task(
    reconciler: Reconciler,
    period: Duration,
    mut command_rx: mpsc::Receiver<SyncCommand>,
    event_tx: mpsc::Sender<SyncEvent>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!("Sync poller started, period {:?}", period);

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_fetch(&reconciler, &event_tx),
            cmd = command_rx.recv() => match cmd {
                Some(SyncCommand::SyncNow) => spawn_fetch(&reconciler, &event_tx),
                Some(SyncCommand::Shutdown) | None => break,
            },
        }
    }

    debug!("Sync poller stopped");
}

fn spawn_fetch(reconciler: &Reconciler, event_tx: &mpsc::Sender<SyncEvent>) {
    let reconciler = reconciler.clone();
    let event_tx = event_tx.clone();

    tokio::spawn(async move {
        let fetched = reconciler.fetch_remote_candidates().await;
        let _ = event_tx.send(SyncEvent::Fetched(fetched)).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quote;
    use crate::storage::{MemoryStore, QUOTES_KEY};
    use crate::store::QuoteStore;
    use crate::sync::reconciler::tests::FakeSource;
    use crate::sync::{MergeOutcome, MergePolicy, SyncOutcome};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn store_with(quotes: &[(&str, &str)]) -> QuoteStore {
        let list: Vec<Quote> = quotes.iter().map(|(t, c)| Quote::new(*t, *c)).collect();
        let backend = MemoryStore::with_entry(QUOTES_KEY, &serde_json::to_string(&list).unwrap());
        QuoteStore::initialize(Box::new(backend), Box::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_trigger_runs_one_cycle() {
        let source = Arc::new(FakeSource::titles(&["new-unique"]));
        let reconciler = Reconciler::new(source.clone(), MergePolicy::Additive, "Server");
        let mut store = store_with(&[("hello", "Life")]);

        // Long period: only the manual trigger can fire
        let mut handle = spawn_sync_poller(reconciler.clone(), Duration::from_secs(3600));
        assert!(handle.trigger().await);

        let SyncEvent::Fetched(fetched) = timeout(WAIT, handle.next_event())
            .await
            .unwrap()
            .unwrap();
        let outcome = reconciler.complete(&mut store, fetched);

        assert_eq!(
            outcome,
            SyncOutcome::Merged(MergeOutcome::Updated { added: 1, removed: 0 })
        );
        assert_eq!(store.list_all()[1], Quote::new("new-unique", "Server"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_schedule_fires_repeatedly() {
        let source = Arc::new(FakeSource::titles(&["a"]));
        let reconciler = Reconciler::new(source.clone(), MergePolicy::Additive, "Server");

        let mut handle = spawn_sync_poller(reconciler, Duration::from_millis(20));

        for _ in 0..2 {
            let event = timeout(WAIT, handle.next_event()).await.unwrap();
            assert!(matches!(event, Some(SyncEvent::Fetched(Ok(_)))));
        }
        assert!(source.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_delivered_as_event() {
        let reconciler = Reconciler::new(
            Arc::new(FakeSource::failing()),
            MergePolicy::Additive,
            "Server",
        );
        let mut store = store_with(&[("hello", "Life")]);

        let mut handle = spawn_sync_poller(reconciler.clone(), Duration::from_secs(3600));
        handle.trigger().await;

        let SyncEvent::Fetched(fetched) = timeout(WAIT, handle.next_event())
            .await
            .unwrap()
            .unwrap();
        assert!(fetched.is_err());

        let outcome = reconciler.complete(&mut store, fetched);
        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_schedule() {
        let reconciler = Reconciler::new(
            Arc::new(FakeSource::titles(&[])),
            MergePolicy::Additive,
            "Server",
        );

        let mut handle = spawn_sync_poller(reconciler, Duration::from_secs(3600));
        handle.shutdown().await;

        // Channel closes once the poller task exits
        let event = timeout(WAIT, handle.next_event()).await.unwrap();
        assert!(event.is_none());
        assert!(!handle.trigger().await);
    }
}
