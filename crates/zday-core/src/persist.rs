//! Saving and restoring the nation table across restarts.
//!
//! The table is written as one JSON document, records sorted by name, to a
//! temporary sibling file that is then renamed over the target. A crash
//! mid-save leaves the previous state file intact.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use zday_types::Record;

use crate::table::NationTable;

/// Current on-disk format version.
pub const STATE_VERSION: u32 = 1;

/// Errors from saving or loading persisted state.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Reading, writing, or renaming the state file failed.
    #[error("state file I/O error at {}: {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The state file is not valid JSON of the expected shape.
    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The state file was written by an incompatible version.
    #[error("unsupported state version {found}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    records: Vec<Record>,
}

/// Serialize `records` into the state document.
///
/// Records are emitted in name order regardless of input order.
///
/// # Errors
///
/// Returns [`PersistError::Serialization`] if encoding fails.
pub fn encode(records: Vec<Record>) -> Result<Vec<u8>, PersistError> {
    let mut records = records;
    records.sort_by(|a, b| a.name.cmp(&b.name));
    let mut bytes = serde_json::to_vec_pretty(&StateFile {
        version: STATE_VERSION,
        records,
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse a state document.
///
/// # Errors
///
/// Returns [`PersistError::Serialization`] for malformed input and
/// [`PersistError::UnsupportedVersion`] for a foreign version.
pub fn decode(bytes: &[u8]) -> Result<Vec<Record>, PersistError> {
    let file: StateFile = serde_json::from_slice(bytes)?;
    if file.version != STATE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: file.version,
        });
    }
    Ok(file.records)
}

/// Write the whole table to `path`.
///
/// # Errors
///
/// Returns [`PersistError`] if encoding, writing, or the final rename
/// fails.
pub async fn save(table: &NationTable, path: &Path) -> Result<usize, PersistError> {
    let records = table.values().await;
    let count = records.len();
    let bytes = encode(records)?;

    let tmp = temp_sibling(path);
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| PersistError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), records = count, "Saved nation table");
    Ok(count)
}

/// Load a table from `path`. A missing file yields an empty table.
///
/// # Errors
///
/// Returns [`PersistError`] if the file exists but cannot be read or
/// parsed.
pub async fn load(path: &Path) -> Result<NationTable, PersistError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No saved state, starting with an empty table");
            return Ok(NationTable::new());
        }
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let records = decode(&bytes)?;
    info!(path = %path.display(), records = records.len(), "Loaded nation table");
    Ok(NationTable::from_records(records))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("state"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
