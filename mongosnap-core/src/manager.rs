//! Snapshot manager
//!
//! Ties the immutable configuration to an exclusively owned store handle and
//! runs each snapshot operation under its configured deadline. Operations are
//! not safe to run concurrently against the same store; callers serialize
//! them.

use crate::config::SnapshotConfig;
use crate::error::{Result, SnapshotError};
use crate::snapshot::{self, RestoreSummary, SnapshotSummary};
use crate::store::{DocumentStore, MongoStore};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Snapshot manager
pub struct SnapshotManager<S: DocumentStore = MongoStore> {
    config: SnapshotConfig,
    store: S,
}

impl SnapshotManager<MongoStore> {
    /// Create the backup directory and connect to the configured server
    pub async fn connect(config: SnapshotConfig) -> Result<Self> {
        let store = with_deadline(
            "connect to MongoDB",
            config.timeouts.connect(),
            MongoStore::connect(&config.mongodb_uri),
        )
        .await?;
        Self::new(config, store)
    }
}

impl<S: DocumentStore> SnapshotManager<S> {
    /// Create a manager around an already connected store
    pub fn new(config: SnapshotConfig, store: S) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.backup_dir).map_err(SnapshotError::io(format!(
            "creating backup directory {}",
            config.backup_dir.display()
        )))?;

        Ok(Self { config, store })
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backup_dir(&self) -> &Path {
        &self.config.backup_dir
    }

    /// Export every database into a new timestamped snapshot
    pub async fn create_snapshot(&self) -> Result<SnapshotSummary> {
        with_deadline(
            "create snapshot",
            self.config.timeouts.operation(),
            snapshot::create_snapshot(&self.store, self.backup_dir()),
        )
        .await
    }

    /// Replace collection contents with those of snapshot `name`
    pub async fn restore_snapshot(&self, name: &str) -> Result<RestoreSummary> {
        with_deadline(
            "restore snapshot",
            self.config.timeouts.operation(),
            snapshot::restore_snapshot(&self.store, self.backup_dir(), name),
        )
        .await
    }

    /// Available snapshot names, newest first
    pub async fn list_snapshots(&self) -> Result<Vec<String>> {
        with_deadline(
            "list snapshots",
            self.config.timeouts.list(),
            snapshot::list_snapshots(self.backup_dir()),
        )
        .await
    }

    /// Close the store connection
    pub async fn close(self) -> Result<()> {
        debug!("Closing snapshot manager");
        with_deadline("close connection", self.config.timeouts.close(), self.store.close()).await
    }
}

async fn with_deadline<T, F>(operation: &'static str, after: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    timeout(after, future)
        .await
        .map_err(|_| SnapshotError::Timeout { operation, after })?
}
