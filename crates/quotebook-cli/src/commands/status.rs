//! Status command handler

use anyhow::Result;

use quotebook_core::sync::SyncPhase;
use quotebook_core::{Config, QuoteStore};

use crate::commands::quote::describe_filter;
use crate::output::{Output, OutputFormat};

/// Show status information
///
/// `phase` is only known inside the shell, where a poller is running.
pub fn show(
    store: &QuoteStore,
    config: &Config,
    phase: Option<SyncPhase>,
    output: &Output,
) -> Result<()> {
    let selected = store.selected_category()?;
    let last_synced = store.last_synced_at()?;
    let stats = store.storage_stats()?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "quotes": store.len(),
                    "categories": store.distinct_categories().len(),
                    "selected_category": selected.as_str(),
                    "sync": {
                        "enabled": config.sync_enabled,
                        "url": config.sync_url,
                        "interval_secs": config.sync_interval().as_secs(),
                        "merge_policy": config.merge_policy.to_string(),
                        "last_synced_at": last_synced.map(|t| t.to_rfc3339()),
                        "phase": phase.map(|p| format!("{:?}", p)),
                    },
                    "storage": {
                        "database": stats.location,
                        "size": stats.size_bytes,
                        "schema_version": stats.schema_version,
                        "keys": stats.keys,
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.len());
        }
        OutputFormat::Human => {
            println!("Quotebook Status");
            println!("================");
            println!();
            println!("Quotes:");
            println!("  Count:      {}", store.len());
            println!("  Categories: {}", store.distinct_categories().len());
            println!("  Selected:   {}", describe_filter(&selected));
            println!();
            println!("Sync:");
            println!(
                "  Status:   {}",
                if config.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!("  Server:   {}", config.sync_url);
            println!("  Interval: {}s", config.sync_interval().as_secs());
            println!("  Policy:   {}", config.merge_policy);
            println!(
                "  Last:     {}",
                last_synced
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "never".to_string())
            );
            if let Some(phase) = phase {
                println!("  Phase:    {:?}", phase);
            }
            println!();
            println!("Storage:");
            match &stats.location {
                Some(path) => println!("  Location: {}", path.display()),
                None => println!("  Location: in memory"),
            }
            println!("  Size:     {}", stats.size_human());
            if let Some(version) = stats.schema_version {
                println!("  Schema:   v{}", version);
            }
            println!("  Keys:     {}", stats.keys);
        }
    }

    Ok(())
}
