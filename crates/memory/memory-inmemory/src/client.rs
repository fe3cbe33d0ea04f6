//! In-memory collection client.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use embedding::EmbeddingService;
use memory_core::{CollectionClient, VectorCollection};
use tokio::sync::RwLock;
use tracing::info;

use crate::collection::{DuplicatePolicy, InMemoryCollection};

/// Holds named [`InMemoryCollection`]s.
#[derive(Clone, Default)]
pub struct InMemoryClient {
    collections: Arc<RwLock<HashMap<String, Arc<InMemoryCollection>>>>,
    duplicates: DuplicatePolicy,
}

impl InMemoryClient {
    /// Creates an empty client whose collections overwrite duplicate ids on add.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty client whose collections apply `policy` to duplicate ids on add.
    pub fn with_duplicate_policy(policy: DuplicatePolicy) -> Self {
        Self {
            collections: Arc::default(),
            duplicates: policy,
        }
    }

    /// Names of existing collections, sorted.
    pub async fn collection_names(&self) -> Vec<String> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl CollectionClient for InMemoryClient {
    async fn heartbeat(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }

    async fn get_or_create_collection(
        &self,
        name: &str,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<Arc<dyn VectorCollection>, anyhow::Error> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| {
                info!(collection = %name, "creating in-memory collection");
                Arc::new(InMemoryCollection::new(name, embedder, self.duplicates))
            })
            .clone();
        Ok(collection)
    }

    async fn delete_collection(&self, name: &str) -> Result<bool, anyhow::Error> {
        let mut collections = self.collections.write().await;
        Ok(collections.remove(name).is_some())
    }
}
