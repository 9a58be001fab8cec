//! Diagnostic logging
//!
//! Logging stays off unless QUOTEBOOK_LOG is set to a level or filter
//! directive (e.g. `debug`). Output goes to `log_file` when configured,
//! otherwise to stderr so it never mixes with command output.

use std::fs::OpenOptions;

use tracing::info;
use tracing_subscriber::EnvFilter;

use quotebook_core::Config;

/// Environment variable that enables logging
pub const LOG_ENV: &str = "QUOTEBOOK_LOG";

/// Initialize logging for this process if requested
pub fn init(config: &Config) {
    let Ok(log_level) = std::env::var(LOG_ENV) else {
        return;
    };

    let env_filter = EnvFilter::new(filter_directive(&log_level));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };

            // Ignore the error if a subscriber is already installed
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("Logging to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

/// Scope a bare level to our own crates; pass full directives through
fn filter_directive(value: &str) -> String {
    let value = value.trim();
    if value.contains('=') || value.contains(',') {
        value.to_string()
    } else {
        format!("quotebook_core={},quotebook_cli={}", value, value)
    }
}
