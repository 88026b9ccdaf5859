//! Document store client abstraction
//!
//! The snapshot writer and reader only need a handful of operations from the
//! database. They are expressed as the [`DocumentStore`] trait so that the
//! MongoDB driver can be swapped for the in-memory store in tests.

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::error::Result;
use async_trait::async_trait;
use bson::Document;

/// Operations the snapshot manager performs against the store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of every database on the server, administrative ones included
    async fn list_database_names(&self) -> Result<Vec<String>>;

    /// Names of every collection in `database`
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>>;

    /// Every document in the collection, unfiltered and unprojected
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>>;

    /// Remove every document from the collection, returning the count removed
    async fn delete_all(&self, database: &str, collection: &str) -> Result<u64>;

    /// Insert `documents` in a single batch, returning the count inserted
    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize>;

    /// Release the connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
