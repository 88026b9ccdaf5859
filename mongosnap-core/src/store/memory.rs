//! In-memory store client
//!
//! Mirrors the server behaviour the snapshot manager relies on: databases
//! and collections spring into existence on first insert, documents without
//! an `_id` get a fresh ObjectId, and a batch insert stops at the first
//! duplicate `_id` after keeping the documents before it.

use super::DocumentStore;
use crate::error::{Result, SnapshotError};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;
use parking_lot::Mutex;
use std::collections::BTreeMap;

type Collections = BTreeMap<String, Vec<Document>>;

/// Store client keeping every database in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    databases: Mutex<BTreeMap<String, Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection, replacing whatever it held
    pub fn put_collection(&self, database: &str, collection: &str, documents: Vec<Document>) {
        self.databases
            .lock()
            .entry(database.to_string())
            .or_default()
            .insert(collection.to_string(), documents);
    }

    /// Snapshot of a collection's documents, `None` if it was never created
    pub fn collection(&self, database: &str, collection: &str) -> Option<Vec<Document>> {
        self.databases
            .lock()
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
    }

    pub fn document_count(&self, database: &str, collection: &str) -> usize {
        self.collection(database, collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.databases.lock().keys().cloned().collect())
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        Ok(self
            .databases
            .lock()
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        Ok(self.collection(database, collection).unwrap_or_default())
    }

    async fn delete_all(&self, database: &str, collection: &str) -> Result<u64> {
        let mut databases = self.databases.lock();
        let deleted = databases
            .get_mut(database)
            .and_then(|collections| collections.get_mut(collection))
            .map(|docs| {
                let count = docs.len() as u64;
                docs.clear();
                count
            })
            .unwrap_or(0);
        Ok(deleted)
    }

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize> {
        if documents.is_empty() {
            return Err(SnapshotError::StoreOperation {
                operation: format!("insert documents into {}.{}", database, collection),
                message: "documents must not be empty".to_string(),
            });
        }

        let mut databases = self.databases.lock();
        let target = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        let mut inserted = 0;
        for mut doc in documents {
            if !doc.contains_key("_id") {
                doc.insert("_id", ObjectId::new());
            }
            let id = doc.get("_id").cloned();
            if target.iter().any(|existing| existing.get("_id") == id.as_ref()) {
                return Err(SnapshotError::StoreOperation {
                    operation: format!("insert documents into {}.{}", database, collection),
                    message: format!("duplicate key _id after {} inserted", inserted),
                });
            }
            target.push(doc);
            inserted += 1;
        }
        Ok(inserted)
    }
}
