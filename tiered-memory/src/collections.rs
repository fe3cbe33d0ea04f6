//! Maps a conversation to its active and archive collections.

use std::sync::Arc;

use dashmap::DashMap;
use embedding::EmbeddingService;
use memory_core::{CollectionClient, VectorCollection};
use tracing::{debug, info, instrument};

use crate::error::{MemoryError, Result};
use crate::types::CollectionStatus;

/// The two tiers of one conversation.
#[derive(Clone)]
pub struct ConversationStores {
    pub active: Arc<dyn VectorCollection>,
    pub archive: Arc<dyn VectorCollection>,
}

/// Resolves conversation ids to [`ConversationStores`], creating collections on
/// first use. Both collections of every conversation share one embedder.
pub struct CollectionResolver {
    client: Arc<dyn CollectionClient>,
    embedder: Arc<dyn EmbeddingService>,
    stores: DashMap<String, ConversationStores>,
}

impl CollectionResolver {
    pub fn new(client: Arc<dyn CollectionClient>, embedder: Arc<dyn EmbeddingService>) -> Self {
        Self {
            client,
            embedder,
            stores: DashMap::new(),
        }
    }

    pub fn active_name(conversation_id: &str) -> String {
        format!("{}:active", conversation_id)
    }

    pub fn archive_name(conversation_id: &str) -> String {
        format!("{}:archive", conversation_id)
    }

    /// Returns the stores of `conversation_id`, creating them if needed.
    #[instrument(skip(self))]
    pub async fn resolve(&self, conversation_id: &str) -> Result<ConversationStores> {
        if let Some(stores) = self.stores.get(conversation_id) {
            return Ok(stores.clone());
        }

        let active = self
            .client
            .get_or_create_collection(&Self::active_name(conversation_id), self.embedder.clone())
            .await
            .map_err(|e| MemoryError::unavailable(conversation_id, e))?;
        let archive = self
            .client
            .get_or_create_collection(&Self::archive_name(conversation_id), self.embedder.clone())
            .await
            .map_err(|e| MemoryError::unavailable(conversation_id, e))?;
        debug!(conversation_id, "collections resolved");

        let stores = ConversationStores { active, archive };
        Ok(self
            .stores
            .entry(conversation_id.to_string())
            .or_insert(stores)
            .clone())
    }

    /// Drops the cached handles of `conversation_id`; the collections stay.
    pub fn forget(&self, conversation_id: &str) {
        if self.stores.remove(conversation_id).is_some() {
            debug!(conversation_id, "cached collections forgotten");
        }
    }

    /// Forgets cached handles and drops both collections.
    #[instrument(skip(self))]
    pub async fn drop_stores(&self, conversation_id: &str) -> Result<CollectionStatus> {
        self.forget(conversation_id);

        let active = self
            .client
            .delete_collection(&Self::active_name(conversation_id))
            .await
            .map_err(|e| MemoryError::unavailable(conversation_id, e))?;
        let archive = self
            .client
            .delete_collection(&Self::archive_name(conversation_id))
            .await
            .map_err(|e| MemoryError::unavailable(conversation_id, e))?;

        if active || archive {
            info!(conversation_id, "collections dropped");
            Ok(CollectionStatus::Dropped)
        } else {
            info!(conversation_id, "no collections to drop");
            Ok(CollectionStatus::Absent)
        }
    }
}
