//! Listing of available snapshots

use crate::error::{Result, SnapshotError};
use std::path::Path;
use tokio::fs;

/// Names of all snapshot directories under `backup_root`, newest first
///
/// Snapshot names are timestamps, so descending lexical order is
/// descending creation order. Plain files in the root are ignored.
pub async fn list_snapshots(backup_root: &Path) -> Result<Vec<String>> {
    let read_error = || SnapshotError::io(format!("reading backup directory {}", backup_root.display()));

    let mut entries = fs::read_dir(backup_root).await.map_err(read_error())?;
    let mut snapshots = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_error())? {
        if entry.file_type().await.map_err(read_error())?.is_dir() {
            snapshots.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    // Sort snapshots in descending order (newest first)
    snapshots.sort_by(|a, b| b.cmp(a));
    Ok(snapshots)
}
