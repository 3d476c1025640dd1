//! JSON snapshots for the in-memory store.
//!
//! Each collection is written as two files in the snapshot directory:
//! `<collection>.json` holds the records and `<collection>.meta.json` holds
//! a [`SnapshotMetadata`] sidecar. The sidecar carries a blake3 hash of the
//! records file, so a truncated or hand-edited snapshot is refused on load
//! rather than silently serving partial data.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use landmem_core::{Error, PlotRecord, Result};
use serde::{Deserialize, Serialize};

const RECORDS_SUFFIX: &str = ".json";
const METADATA_SUFFIX: &str = ".meta.json";

/// Metadata stored alongside a collection snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Collection name.
    pub collection: String,

    /// Number of records in the snapshot.
    pub count: usize,

    /// Vector width of every record.
    pub dimension: usize,

    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,

    /// blake3 hash of the records file.
    pub content_hash: String,
}

/// Paths of the records file and the metadata sidecar for `collection`.
pub fn snapshot_paths(dir: &Path, collection: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{collection}{RECORDS_SUFFIX}")),
        dir.join(format!("{collection}{METADATA_SUFFIX}")),
    )
}

/// Write `records` as the snapshot of `collection`, replacing any previous one.
pub fn save_snapshot(
    dir: &Path,
    collection: &str,
    dimension: usize,
    records: &[PlotRecord],
) -> Result<SnapshotMetadata> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
    let (records_path, metadata_path) = snapshot_paths(dir, collection);

    let body = serde_json::to_vec(records)?;
    let metadata = SnapshotMetadata {
        collection: collection.to_string(),
        count: records.len(),
        dimension,
        saved_at: Utc::now(),
        content_hash: blake3::hash(&body).to_hex().to_string(),
    };

    write_replacing(&records_path, &body)?;
    write_replacing(&metadata_path, &serde_json::to_vec_pretty(&metadata)?)?;
    log::debug!(
        "Saved snapshot of '{}' ({} records) to {}",
        collection,
        metadata.count,
        records_path.display()
    );
    Ok(metadata)
}

/// Load the snapshot of `collection`.
///
/// # Errors
///
/// Returns an I/O error when either file is missing, and an invalid-data
/// error when the content hash or record count disagrees with the sidecar.
pub fn load_snapshot(dir: &Path, collection: &str) -> Result<(SnapshotMetadata, Vec<PlotRecord>)> {
    let (records_path, metadata_path) = snapshot_paths(dir, collection);

    let metadata = load_metadata(&metadata_path)?;
    let body = std::fs::read(&records_path).map_err(|e| Error::io_with_path(e, &records_path))?;

    let hash = blake3::hash(&body).to_hex().to_string();
    if hash != metadata.content_hash {
        return Err(Error::invalid_data(format!(
            "snapshot {} does not match its metadata hash",
            records_path.display()
        )));
    }

    let records: Vec<PlotRecord> = serde_json::from_slice(&body)?;
    if records.len() != metadata.count {
        return Err(Error::invalid_data(format!(
            "snapshot {} holds {} records, metadata says {}",
            records_path.display(),
            records.len(),
            metadata.count
        )));
    }
    Ok((metadata, records))
}

/// Load a snapshot metadata sidecar.
pub fn load_metadata(metadata_path: &Path) -> Result<SnapshotMetadata> {
    let json = std::fs::read_to_string(metadata_path)
        .map_err(|e| Error::io_with_path(e, metadata_path))?;
    Ok(serde_json::from_str(&json)?)
}

/// Collections that have a snapshot in `dir`, sorted by name.
///
/// A missing directory has no snapshots.
pub fn list_snapshots(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut collections = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io_with_path(e, dir))? {
        let entry = entry.map_err(|e| Error::io_with_path(e, dir))?;
        let name = entry.file_name();
        if let Some(collection) = name.to_str().and_then(|n| n.strip_suffix(METADATA_SUFFIX)) {
            collections.push(collection.to_string());
        }
    }
    collections.sort();
    Ok(collections)
}

fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).map_err(|e| Error::io_with_path(e, &tmp))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::io_with_path(e, path))
}

// ============================================================================
// Tests
// ============================================================================
