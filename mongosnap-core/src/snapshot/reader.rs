//! Snapshot reader implementation
//!
//! Restoring replaces collection contents: every collection present in the
//! snapshot is cleared first, then refilled from its export file. Lines that
//! fail to parse are logged and skipped, unlike the writer which aborts on
//! the first document it cannot encode. A failed insert after the clear
//! leaves the collection emptied; there is no transaction spanning both.

use super::{decode_line, is_admin_database, RestoreSummary, COLLECTION_SUFFIX};
use crate::error::{Result, SnapshotError};
use crate::store::DocumentStore;
use bson::Document;
use std::fs::FileType;
use std::path::{Component, Path};
use tokio::fs;
use tracing::{info, warn};

/// Restore the snapshot `name` found under `backup_root`
pub async fn restore_snapshot<S>(store: &S, backup_root: &Path, name: &str) -> Result<RestoreSummary>
where
    S: DocumentStore + ?Sized,
{
    if !is_plain_name(name) {
        return Err(SnapshotError::NotFound(format!(
            "snapshot {} does not exist",
            name
        )));
    }

    let snapshot_path = backup_root.join(name);
    match fs::metadata(&snapshot_path).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(SnapshotError::NotFound(format!(
                "snapshot {} is not a directory",
                name
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SnapshotError::NotFound(format!(
                "snapshot {} does not exist",
                name
            )))
        }
        Err(e) => {
            return Err(SnapshotError::io(format!("reading {}", snapshot_path.display()))(e))
        }
    }

    let mut summary = RestoreSummary {
        name: name.to_string(),
        ..Default::default()
    };

    for db_name in entry_names(&snapshot_path, FileType::is_dir).await? {
        if is_admin_database(&db_name) {
            warn!("Skipping administrative database in snapshot: {}", db_name);
            continue;
        }

        info!("Restoring database: {}", db_name);
        let db_path = snapshot_path.join(&db_name);

        for file_name in entry_names(&db_path, FileType::is_file).await? {
            let collection = match file_name.strip_suffix(COLLECTION_SUFFIX) {
                Some(collection) if !collection.is_empty() => collection,
                _ => continue,
            };

            let (inserted, skipped) =
                restore_collection(store, &db_name, collection, &db_path.join(&file_name)).await?;

            summary.collections += 1;
            summary.documents += inserted;
            summary.skipped_lines += skipped;
        }

        summary.databases += 1;
    }

    info!("Snapshot {} restored successfully", name);
    Ok(summary)
}

/// Clear one collection and refill it from `path`
///
/// The export is read before the collection is cleared, so an unreadable
/// file leaves the collection as it was. Returns the number of documents
/// inserted and of lines skipped.
async fn restore_collection<S>(
    store: &S,
    database: &str,
    collection: &str,
    path: &Path,
) -> Result<(u64, usize)>
where
    S: DocumentStore + ?Sized,
{
    info!("Restoring collection: {}", collection);

    let content = fs::read(path)
        .await
        .map_err(SnapshotError::io(format!("reading collection file {}", path.display())))?;
    let (documents, skipped) = parse_export(&content, path);

    store.delete_all(database, collection).await?;

    if documents.is_empty() {
        return Ok((0, skipped));
    }

    let inserted = store.insert_many(database, collection, documents).await?;
    info!("Restored {} documents to {}.{}", inserted, database, collection);

    Ok((inserted as u64, skipped))
}

/// Parse every non-blank line of an export, skipping malformed ones
///
/// Lines are split on raw bytes so that invalid UTF-8 only costs the line
/// it appears on.
fn parse_export(content: &[u8], path: &Path) -> (Vec<Document>, usize) {
    let mut documents = Vec::new();
    let mut skipped = 0;

    for (index, raw) in content.split(|byte| *byte == b'\n').enumerate() {
        let parsed = match std::str::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => decode_line(line.trim(), index + 1),
            Err(e) => Err(SnapshotError::Parse {
                line: index + 1,
                message: e.to_string(),
            }),
        };

        match parsed {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                warn!("Error parsing document in {}: {}", path.display(), e);
                skipped += 1;
            }
        }
    }

    (documents, skipped)
}

/// Sorted names of the entries in `dir` whose type satisfies `keep`
async fn entry_names(dir: &Path, keep: fn(&FileType) -> bool) -> Result<Vec<String>> {
    let read_error = || SnapshotError::io(format!("reading directory {}", dir.display()));

    let mut entries = fs::read_dir(dir).await.map_err(read_error())?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_error())? {
        let file_type = entry.file_type().await.map_err(read_error())?;
        if !keep(&file_type) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!("Skipping non UTF-8 entry {:?} in {}", raw, dir.display()),
        }
    }

    names.sort();
    Ok(names)
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use bson::doc;
    use tempfile::TempDir;

    fn write_export(
        root: &Path,
        snapshot: &str,
        db: &str,
        collection: &str,
        content: impl AsRef<[u8]>,
    ) {
        let dir = root.join(snapshot).join(db);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.json", collection)), content).unwrap();
    }

    #[tokio::test]
    async fn test_missing_snapshot_leaves_store_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        store.put_collection("app", "users", vec![doc! { "_id": 1 }]);

        let err = restore_snapshot(&store, temp_dir.path(), "20240101_020000")
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::NotFound(_)));
        assert_eq!(store.document_count("app", "users"), 1);
    }

    #[tokio::test]
    async fn test_path_like_names_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = MemoryStore::new();

        for name in ["", "..", "a/b", "/etc"] {
            let err = restore_snapshot(&store, temp_dir.path(), name).await.unwrap_err();
            assert!(matches!(err, SnapshotError::NotFound(_)), "name {:?}", name);
        }
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        write_export(
            temp_dir.path(),
            "snap",
            "app",
            "a_users",
            "{\"_id\":1}\n{\"_id\": \n{\"_id\":2}\n{\"_id\":3}\n",
        );
        write_export(temp_dir.path(), "snap", "app", "b_orders", "{\"_id\":10}\n");

        let store = MemoryStore::new();
        let summary = restore_snapshot(&store, temp_dir.path(), "snap").await.unwrap();

        assert_eq!(store.document_count("app", "a_users"), 3);
        assert_eq!(store.document_count("app", "b_orders"), 1);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.documents, 4);
        assert_eq!(summary.collections, 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        write_export(
            temp_dir.path(),
            "snap",
            "app",
            "a_users",
            b"{\"_id\":1}\n{\"_id\":2}\n{\"_id\":\"\xff\xfe\"}\n{\"_id\":3}\n",
        );
        write_export(temp_dir.path(), "snap", "app", "b_orders", "{\"_id\":10}");

        let store = MemoryStore::new();
        store.put_collection("app", "a_users", vec![doc! { "_id": 99 }]);
        store.put_collection("app", "b_orders", vec![doc! { "_id": 98 }]);

        let summary = restore_snapshot(&store, temp_dir.path(), "snap").await.unwrap();

        assert_eq!(
            store.collection("app", "a_users").unwrap(),
            vec![doc! { "_id": 1 }, doc! { "_id": 2 }, doc! { "_id": 3 }]
        );
        assert_eq!(store.collection("app", "b_orders").unwrap(), vec![doc! { "_id": 10 }]);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.documents, 4);
    }

    #[test]
    fn test_crlf_and_unterminated_lines() {
        let (documents, skipped) =
            parse_export(b"{\"_id\":1}\r\n\r\n{\"_id\":2}", Path::new("users.json"));

        assert_eq!(documents, vec![doc! { "_id": 1 }, doc! { "_id": 2 }]);
        assert_eq!(skipped, 0);
    }

    #[tokio::test]
    async fn test_empty_export_clears_collection() {
        let temp_dir = TempDir::new().unwrap();
        write_export(temp_dir.path(), "snap", "app", "users", "\n  \n");

        let store = MemoryStore::new();
        store.put_collection("app", "users", vec![doc! { "_id": 1 }, doc! { "_id": 2 }]);

        restore_snapshot(&store, temp_dir.path(), "snap").await.unwrap();

        assert_eq!(store.document_count("app", "users"), 0);
    }

    #[tokio::test]
    async fn test_collections_absent_from_snapshot_are_untouched() {
        let temp_dir = TempDir::new().unwrap();
        write_export(temp_dir.path(), "snap", "app", "users", "{\"_id\":1}\n");

        let store = MemoryStore::new();
        store.put_collection("app", "users", vec![doc! { "_id": 7 }]);
        store.put_collection("app", "audit", vec![doc! { "_id": 8 }]);

        restore_snapshot(&store, temp_dir.path(), "snap").await.unwrap();

        let users = store.collection("app", "users").unwrap();
        assert_eq!(users, vec![doc! { "_id": 1 }]);
        assert_eq!(store.collection("app", "audit").unwrap(), vec![doc! { "_id": 8 }]);
    }

    #[tokio::test]
    async fn test_insert_failure_aborts_after_clearing() {
        let temp_dir = TempDir::new().unwrap();
        write_export(temp_dir.path(), "snap", "app", "a_users", "{\"_id\":1}\n{\"_id\":1}\n");
        write_export(temp_dir.path(), "snap", "app", "b_orders", "{\"_id\":10}\n");

        let store = MemoryStore::new();
        store.put_collection("app", "a_users", vec![doc! { "_id": 5 }]);
        store.put_collection("app", "b_orders", vec![doc! { "_id": 6 }]);

        let err = restore_snapshot(&store, temp_dir.path(), "snap").await.unwrap_err();

        assert!(matches!(err, SnapshotError::StoreOperation { .. }));
        let users = store.collection("app", "a_users").unwrap();
        assert!(!users.contains(&doc! { "_id": 5 }));
        // later collections are not reached
        assert_eq!(store.collection("app", "b_orders").unwrap(), vec![doc! { "_id": 6 }]);
    }

    #[tokio::test]
    async fn test_non_export_entries_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        write_export(temp_dir.path(), "snap", "app", "users", "{\"_id\":1}\n");
        write_export(temp_dir.path(), "snap", "admin", "system.users", "{\"_id\":\"root\"}\n");
        let db_dir = temp_dir.path().join("snap").join("app");
        std::fs::write(db_dir.join("README.txt"), "notes").unwrap();
        std::fs::create_dir(db_dir.join("nested.json")).unwrap();
        std::fs::write(temp_dir.path().join("snap").join("stray.json"), "{}").unwrap();

        let store = MemoryStore::new();
        let summary = restore_snapshot(&store, temp_dir.path(), "snap").await.unwrap();

        assert_eq!(summary.databases, 1);
        assert_eq!(summary.collections, 1);
        assert!(store.collection("admin", "system.users").is_none());
        assert!(store.collection("app", "nested").is_none());
    }

    /// Store that refuses to delete
    struct UndeletableStore(MemoryStore);

    #[async_trait]
    impl DocumentStore for UndeletableStore {
        async fn list_database_names(&self) -> Result<Vec<String>> {
            self.0.list_database_names().await
        }

        async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
            self.0.list_collection_names(database).await
        }

        async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
            self.0.find_all(database, collection).await
        }

        async fn delete_all(&self, database: &str, collection: &str) -> Result<u64> {
            Err(SnapshotError::StoreOperation {
                operation: format!("delete documents from {}.{}", database, collection),
                message: "not authorized".to_string(),
            })
        }

        async fn insert_many(
            &self,
            database: &str,
            collection: &str,
            documents: Vec<Document>,
        ) -> Result<usize> {
            self.0.insert_many(database, collection, documents).await
        }
    }

    #[tokio::test]
    async fn test_delete_failure_aborts_before_insert() {
        let temp_dir = TempDir::new().unwrap();
        write_export(temp_dir.path(), "snap", "app", "users", "{\"_id\":1}\n");

        let store = UndeletableStore(MemoryStore::new());
        store.0.put_collection("app", "users", vec![doc! { "_id": 7 }]);

        let err = restore_snapshot(&store, temp_dir.path(), "snap").await.unwrap_err();

        assert!(matches!(err, SnapshotError::StoreOperation { .. }));
        assert_eq!(store.0.collection("app", "users").unwrap(), vec![doc! { "_id": 7 }]);
    }
}
