//! JSON export and import files
//!
//! Exports are written atomically (temp file, sync, rename) so an
//! interrupted export never leaves a truncated `quotes.json` behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::QuoteResult;
use crate::storage::StorageError;
use crate::store::QuoteStore;

/// File name used when no export path is given
pub const EXPORT_FILE_NAME: &str = "quotes.json";

/// Write the store's quotes to `path` as pretty-printed JSON
///
/// Returns the number of quotes written.
pub fn export_to_file(store: &QuoteStore, path: &Path) -> QuoteResult<usize> {
    let json = store.export_json()?;
    atomic_write(path, json.as_bytes())?;
    info!("Exported {} quotes to {:?}", store.len(), path);
    Ok(store.len())
}

/// Import quotes from a JSON file into the store
///
/// Returns the number of quotes imported.
pub fn import_from_file(store: &mut QuoteStore, path: &Path) -> QuoteResult<usize> {
    let content =
        fs::read_to_string(path).map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;
    let count = store.import_json(&content)?;
    info!("Imported {} quotes from {:?}", count, path);
    Ok(count)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    let io_err = |e| StorageError::from_io(e, temp_path.clone());

    let mut file = File::create(&temp_path).map_err(io_err)?;
    file.write_all(data).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;

    Ok(())
}
