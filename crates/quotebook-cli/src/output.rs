//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use quotebook_core::{Quote, QuoteError, StorageError};

/// Shown when a filter leaves nothing to display
pub const NO_QUOTES_MESSAGE: &str = "No quotes available for this category.";

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single quote
    pub fn print_quote(&self, quote: &Quote) {
        match self.format {
            OutputFormat::Human => println!("{}", quote),
            OutputFormat::Json => print_json(quote),
            OutputFormat::Quiet => println!("{}", quote.text),
        }
    }

    /// Print a list of quotes
    pub fn print_quotes(&self, quotes: &[Quote]) {
        match self.format {
            OutputFormat::Human => {
                if quotes.is_empty() {
                    println!("{}", NO_QUOTES_MESSAGE);
                    return;
                }
                for quote in quotes {
                    println!("{}", quote);
                }
                println!("\n{} quote(s)", quotes.len());
            }
            OutputFormat::Json => print_json(&quotes),
            OutputFormat::Quiet => {
                for quote in quotes {
                    println!("{}", quote.text);
                }
            }
        }
    }

    /// Print categories with the number of quotes in each
    pub fn print_categories(&self, categories: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories found.");
                    return;
                }
                for (name, count) in categories {
                    println!("{} ({})", name, count);
                }
                println!("\n{} categories", categories.len());
            }
            OutputFormat::Json => {
                let json: Vec<_> = categories
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json);
            }
            OutputFormat::Quiet => {
                for (name, _) in categories {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Report an error without aborting (used by the shell)
    pub fn error(&self, msg: &str) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"status": "error", "message": msg}));
            }
            _ => eprintln!("Error: {}", msg),
        }
    }

    /// Report a failed command along with its kind and a recovery hint
    pub fn report(&self, err: &anyhow::Error) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "error",
                        "kind": error_kind(err),
                        "message": format!("{:#}", err),
                        "hint": recovery_hint(err),
                    })
                );
            }
            _ => report_failure(err),
        }
    }
}

/// Print an error and its recovery hint to stderr
pub fn report_failure(err: &anyhow::Error) {
    eprintln!("Error: {:#}", err);
    if let Some(hint) = recovery_hint(err) {
        eprintln!("Hint: {}", hint);
    }
}

/// Label of the first quote error in the chain
fn error_kind(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<QuoteError>())
        .map(QuoteError::kind)
}

/// What the user can do about a storage failure, if anything
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        // QuoteError::Storage is transparent, so the storage error is not its own link
        match cause.downcast_ref::<QuoteError>() {
            Some(QuoteError::Storage(storage)) => storage.recovery_suggestion(),
            _ => cause
                .downcast_ref::<StorageError>()
                .and_then(StorageError::recovery_suggestion),
        }
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: could not serialize output: {}", e),
    }
}
