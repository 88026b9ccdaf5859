//! Snapshot creation, restore and listing
//!
//! On-disk layout:
//! ```text
//! <backup_dir>/<YYYYMMDD_HHMMSS>/<database>/<collection>.json
//! ```
//! Each collection file holds one canonical extended JSON document per line.

pub mod catalog;
pub mod format;
pub mod reader;
pub mod writer;

pub use catalog::list_snapshots;
pub use format::{decode_line, encode_document};
pub use reader::restore_snapshot;
pub use writer::{create_snapshot, create_snapshot_at, CollectionWriter};

use chrono::NaiveDateTime;
use std::path::PathBuf;

/// chrono format of snapshot directory names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File suffix of a collection export
pub const COLLECTION_SUFFIX: &str = ".json";

/// Databases that are never exported or restored
pub const ADMIN_DATABASES: [&str; 2] = ["admin", "local"];

/// Whether `name` is one of [`ADMIN_DATABASES`]
pub fn is_admin_database(name: &str) -> bool {
    ADMIN_DATABASES.contains(&name)
}

/// Directory name of a snapshot taken at `at`
pub fn snapshot_name(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Outcome of a completed snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Snapshot name (its timestamp)
    pub name: String,
    /// Snapshot directory
    pub path: PathBuf,
    /// Databases exported
    pub databases: usize,
    /// Collections exported
    pub collections: usize,
    /// Documents written across all collections
    pub documents: u64,
}

/// Outcome of a completed restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub name: String,
    pub databases: usize,
    pub collections: usize,
    /// Documents inserted across all collections
    pub documents: u64,
    /// Lines that failed to parse and were skipped
    pub skipped_lines: usize,
}
