//! Export and import command handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quotebook_core::transfer::{export_to_file, import_from_file, EXPORT_FILE_NAME};
use quotebook_core::QuoteStore;

use crate::output::Output;

/// Export all quotes to a JSON file (`quotes.json` by default)
pub fn export(store: &QuoteStore, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
    let count = export_to_file(store, &path)
        .with_context(|| format!("Failed to export quotes to {}", path.display()))?;

    if output.is_quiet() {
        println!("{}", path.display());
    } else {
        output.success(&format!("Exported {} quotes to {}", count, path.display()));
    }
    Ok(())
}

/// Import quotes from a JSON file
pub fn import(store: &mut QuoteStore, path: &Path, output: &Output) -> Result<()> {
    let count = import_from_file(store, path)
        .with_context(|| format!("Invalid JSON file: {}", path.display()))?;
    output.success(&format!("Quotes imported successfully! ({} added)", count));
    Ok(())
}
