//! Snapshot writer implementation

use super::{encode_document, is_admin_database, snapshot_name, SnapshotSummary, COLLECTION_SUFFIX};
use crate::error::{Result, SnapshotError};
use crate::store::DocumentStore;
use bson::Document;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

/// Line-delimited writer for a single collection export
pub struct CollectionWriter {
    /// Buffered file writer
    writer: BufWriter<File>,
    /// Path to the export file
    path: PathBuf,
    /// Number of documents written
    documents: u64,
}

impl CollectionWriter {
    /// Create (or truncate) the export file at `path`
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .map_err(SnapshotError::io(format!("creating {}", path.display())))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            documents: 0,
        })
    }

    /// Append one document followed by a newline
    pub async fn write_document(&mut self, doc: Document) -> Result<()> {
        let mut line = encode_document(doc)?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(SnapshotError::io(format!("writing {}", self.path.display())))?;
        self.documents += 1;
        Ok(())
    }

    /// Flush the file, returning the number of documents written
    pub async fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .await
            .map_err(SnapshotError::io(format!("flushing {}", self.path.display())))?;
        Ok(self.documents)
    }
}

/// Export every non-administrative database into a new snapshot directory
/// named after the current local time
pub async fn create_snapshot<S>(store: &S, backup_root: &Path) -> Result<SnapshotSummary>
where
    S: DocumentStore + ?Sized,
{
    create_snapshot_at(store, backup_root, Local::now().naive_local()).await
}

/// Export every non-administrative database into `<backup_root>/<at>`
///
/// The snapshot directory must not exist yet. Any store, encode or I/O
/// failure aborts the whole snapshot and leaves what was written so far.
pub async fn create_snapshot_at<S>(
    store: &S,
    backup_root: &Path,
    at: NaiveDateTime,
) -> Result<SnapshotSummary>
where
    S: DocumentStore + ?Sized,
{
    let name = snapshot_name(&at);
    let snapshot_path = backup_root.join(&name);

    fs::create_dir_all(backup_root)
        .await
        .map_err(SnapshotError::io(format!("creating backup directory {}", backup_root.display())))?;
    fs::create_dir(&snapshot_path)
        .await
        .map_err(SnapshotError::io(format!("creating snapshot directory {}", snapshot_path.display())))?;

    let mut summary = SnapshotSummary {
        name,
        path: snapshot_path.clone(),
        databases: 0,
        collections: 0,
        documents: 0,
    };

    let databases = store.list_database_names().await?;

    for db_name in databases.iter().filter(|name| !is_admin_database(name)) {
        info!("Creating snapshot for database: {}", db_name);

        let db_path = snapshot_path.join(db_name);
        fs::create_dir_all(&db_path)
            .await
            .map_err(SnapshotError::io(format!("creating database directory {}", db_path.display())))?;

        let collections = store.list_collection_names(db_name).await?;

        for collection in &collections {
            let documents = store.find_all(db_name, collection).await?;

            let file_path = db_path.join(format!("{}{}", collection, COLLECTION_SUFFIX));
            let mut writer = CollectionWriter::create(&file_path).await?;
            for doc in documents {
                writer.write_document(doc).await?;
            }
            let written = writer.finish().await?;

            info!("Exported {} documents from {}.{}", written, db_name, collection);
            summary.collections += 1;
            summary.documents += written;
        }

        summary.databases += 1;
    }

    info!("Snapshot completed successfully at {}", summary.name);
    Ok(summary)
}
