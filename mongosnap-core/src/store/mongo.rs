//! MongoDB-backed store client

use super::DocumentStore;
use crate::error::{Result, SnapshotError};
use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::{debug, info};

/// Store client wrapping a connected `mongodb::Client`
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// Connect to `uri` and verify the server answers a ping
    pub async fn connect(uri: &str) -> Result<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|e| SnapshotError::Connectivity(format!("failed to connect to MongoDB: {}", e)))?;
        let client = Client::with_options(options)
            .map_err(|e| SnapshotError::Connectivity(format!("failed to connect to MongoDB: {}", e)))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| SnapshotError::Connectivity(format!("failed to ping MongoDB: {}", e)))?;

        info!("Successfully connected to MongoDB");
        Ok(Self { client })
    }

    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection(collection)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_database_names(&self) -> Result<Vec<String>> {
        self.client
            .list_database_names(None, None)
            .await
            .map_err(SnapshotError::store("list databases"))
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        self.client
            .database(database)
            .list_collection_names(None)
            .await
            .map_err(SnapshotError::store(format!("list collections of {}", database)))
    }

    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        let cursor = self
            .collection(database, collection)
            .find(None, None)
            .await
            .map_err(SnapshotError::store(format!("find documents in {}.{}", database, collection)))?;

        cursor
            .try_collect()
            .await
            .map_err(SnapshotError::store(format!("read documents from {}.{}", database, collection)))
    }

    async fn delete_all(&self, database: &str, collection: &str) -> Result<u64> {
        let result = self
            .collection(database, collection)
            .delete_many(doc! {}, None)
            .await
            .map_err(SnapshotError::store(format!("clear collection {}.{}", database, collection)))?;
        Ok(result.deleted_count)
    }

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize> {
        let result = self
            .collection(database, collection)
            .insert_many(documents, None)
            .await
            .map_err(SnapshotError::store(format!("insert documents into {}.{}", database, collection)))?;
        Ok(result.inserted_ids.len())
    }

    async fn close(&self) -> Result<()> {
        debug!("Shutting down MongoDB client");
        self.client.clone().shutdown().await;
        Ok(())
    }
}
