//! # Vector Collections
//!
//! Interface to the external vector index. A [`CollectionClient`] owns named
//! collections; each [`VectorCollection`] is bound at creation to one
//! [`EmbeddingService`] and embeds record text itself, so callers only ever pass
//! text.
//!
//! Batch operations are not assumed to be atomic: a failing `add` may have
//! persisted a prefix of the batch. Callers that need all-or-nothing behavior
//! delete by id and retry.

use std::sync::Arc;

use async_trait::async_trait;
use embedding::EmbeddingService;

use crate::types::{QueryHit, Record, RecordFilter};

/// One logical collection of the vector index.
#[async_trait]
pub trait VectorCollection: Send + Sync {
    /// Collection name as known to the client.
    fn name(&self) -> &str;

    /// Embeds and appends records. Depending on the backend, ids that already
    /// exist are either rejected or overwritten.
    async fn add(&self, records: Vec<Record>) -> Result<(), anyhow::Error>;

    /// Embeds and writes records, overwriting existing records with the same id.
    async fn upsert(&self, records: Vec<Record>) -> Result<(), anyhow::Error>;

    /// Returns up to `limit` records nearest to `text`, most similar first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryHit>, anyhow::Error>;

    /// Returns the records selected by `filter` in insertion order.
    async fn get(&self, filter: &RecordFilter) -> Result<Vec<Record>, anyhow::Error>;

    /// Deletes records by id and returns how many existed. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<usize, anyhow::Error>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<usize, anyhow::Error>;
}

/// Connection to the vector index.
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Checks that the index is reachable.
    async fn heartbeat(&self) -> Result<(), anyhow::Error>;

    /// Returns the collection called `name`, creating it bound to `embedder` if it
    /// does not exist. Calling it again for the same name returns the same
    /// underlying collection.
    async fn get_or_create_collection(
        &self,
        name: &str,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<Arc<dyn VectorCollection>, anyhow::Error>;

    /// Drops the collection. Returns `false` if it did not exist.
    async fn delete_collection(&self, name: &str) -> Result<bool, anyhow::Error>;
}
