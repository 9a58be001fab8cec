//! Sync command handler

use anyhow::{bail, Result};

use quotebook_core::sync::{MergeOutcome, Reconciler, SyncOutcome};
use quotebook_core::{Config, QuoteStore};

use crate::output::{Output, OutputFormat};

/// Fetch the remote feed once and merge it
pub async fn sync(store: &mut QuoteStore, config: &Config, output: &Output) -> Result<()> {
    if !config.sync_enabled {
        bail!(
            "Sync is not enabled. Enable it with:\n  \
             quotebook config set sync_enabled true"
        );
    }

    let reconciler = Reconciler::from_config(config)?;
    output.message(&format!(
        "Syncing with {} ({} merge into '{}')...",
        reconciler.source_description(),
        reconciler.policy(),
        reconciler.tag()
    ));

    let outcome = reconciler.sync_once(store).await;
    print_outcome(&outcome, output);

    if let SyncOutcome::Failed(reason) = outcome {
        bail!("{}", reason);
    }
    Ok(())
}

/// Report the result of a sync cycle
pub fn print_outcome(outcome: &SyncOutcome, output: &Output) {
    match output.format {
        OutputFormat::Json => {
            let json = match outcome {
                SyncOutcome::Merged(MergeOutcome::Updated { added, removed }) => {
                    serde_json::json!({"status": "updated", "added": added, "removed": removed})
                }
                SyncOutcome::Merged(MergeOutcome::NoChange) => {
                    serde_json::json!({"status": "no_change"})
                }
                SyncOutcome::Failed(reason) => {
                    serde_json::json!({"status": "failed", "reason": reason})
                }
            };
            println!("{}", json);
        }
        OutputFormat::Quiet => {}
        OutputFormat::Human => {
            println!("{}", outcome.status_line());
            if let SyncOutcome::Merged(MergeOutcome::Updated { added, removed }) = outcome {
                println!("  Added: {}, Removed: {}", added, removed);
            }
        }
    }
}
