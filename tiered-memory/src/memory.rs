//! [`TieredMemory`]: the context object every operation goes through.
//!
//! It is built from a [`MemoryConfig`] in the uninitialized state and becomes
//! usable once [`TieredMemory::initialize`] has reached the vector index. Every
//! entry point checks the state first and fails with
//! [`MemoryError::NotInitialized`] before touching anything.

use std::collections::BTreeSet;
use std::sync::Arc;

use embedding::EmbeddingService;
use memory_core::{CollectionClient, RecordFilter, UnitId};
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::archiver;
use crate::chunker::Chunker;
use crate::collections::CollectionResolver;
use crate::config::MemoryConfig;
use crate::error::{MemoryError, Result};
use crate::maintenance::{self, MaintenancePolicy};
use crate::retriever::{self, RetrievalOptions};
use crate::types::{
    ArchiveAck, CollectionStatus, MaintenanceOutcome, MemoryStats, WriteAck,
};
use crate::writer;

pub struct TieredMemory {
    chunker: Chunker,
    policy: MaintenancePolicy,
    retrieval: RetrievalOptions,
    resolver: OnceCell<CollectionResolver>,
}

impl TieredMemory {
    /// Creates an uninitialized memory. Invalid chunking values are rejected here.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        if config.archive_batch_size == 0 {
            return Err(MemoryError::InvalidConfig(
                "archive batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            chunker,
            policy: MaintenancePolicy {
                max_active_units: config.max_active_units,
                batch_size: config.archive_batch_size,
            },
            retrieval: RetrievalOptions {
                active_results: config.active_results,
                archive_results: config.archive_results,
                summary_marker: config.summary_marker,
                separator: config.context_separator,
            },
            resolver: OnceCell::new(),
        })
    }

    /// Binds the collaborators after checking the index is reachable. Repeated
    /// calls after success are no-ops.
    pub async fn initialize(
        &self,
        client: Arc<dyn CollectionClient>,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<()> {
        if self.is_ready() {
            info!("memory already initialized");
            return Ok(());
        }
        client
            .heartbeat()
            .await
            .map_err(|e| MemoryError::StoreUnavailable {
                conversation_id: None,
                message: format!("{:#}", e),
            })?;
        if self
            .resolver
            .set(CollectionResolver::new(client, embedder))
            .is_err()
        {
            info!("memory initialized concurrently");
        }
        info!("memory ready");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.resolver.initialized()
    }

    fn ready(&self) -> Result<&CollectionResolver> {
        self.resolver.get().ok_or(MemoryError::NotInitialized)
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Chunks `text` into the active tier under `unit_id`.
    pub async fn add_to_memory(
        &self,
        conversation_id: &str,
        unit_id: &UnitId,
        text: &str,
    ) -> Result<WriteAck> {
        let resolver = self.ready()?;
        writer::add_to_memory(resolver, &self.chunker, conversation_id, unit_id, text).await
    }

    /// One maintenance pass. The worker runs this after every successful write.
    pub async fn run_maintenance(&self, conversation_id: &str) -> Result<MaintenanceOutcome> {
        let resolver = self.ready()?;
        maintenance::run_maintenance(resolver, &self.policy, conversation_id).await
    }

    /// Moves `unit_id` to the archive tier with `summary` as its text.
    pub async fn archive(
        &self,
        conversation_id: &str,
        unit_id: &UnitId,
        summary: &str,
    ) -> Result<ArchiveAck> {
        let resolver = self.ready()?;
        archiver::archive(resolver, conversation_id, unit_id, summary).await
    }

    /// Merged context of both tiers for `query`; empty when nothing matches.
    pub async fn get_context(&self, conversation_id: &str, query: &str) -> Result<String> {
        let resolver = self.ready()?;
        retriever::get_context(resolver, &self.retrieval, conversation_id, query).await
    }

    /// Makes sure both tiers exist.
    pub async fn create_collection(&self, conversation_id: &str) -> Result<()> {
        let resolver = self.ready()?;
        resolver.resolve(conversation_id).await?;
        Ok(())
    }

    /// Empties both tiers and recreates them.
    #[instrument(skip(self))]
    pub async fn clear_collection(&self, conversation_id: &str) -> Result<CollectionStatus> {
        let resolver = self.ready()?;
        let status = resolver.drop_stores(conversation_id).await?;
        resolver.resolve(conversation_id).await?;
        Ok(status)
    }

    /// Drops both tiers. Unknown conversations report [`CollectionStatus::Absent`].
    pub async fn delete_collection(&self, conversation_id: &str) -> Result<CollectionStatus> {
        let resolver = self.ready()?;
        resolver.drop_stores(conversation_id).await
    }

    /// Counts units and chunks per tier.
    pub async fn stats(&self, conversation_id: &str) -> Result<MemoryStats> {
        let resolver = self.ready()?;
        let stores = resolver.resolve(conversation_id).await?;

        let active = stores
            .active
            .get(&RecordFilter::All)
            .await
            .map_err(|e| MemoryError::unavailable(conversation_id, e))?;
        let archived_units = stores
            .archive
            .count()
            .await
            .map_err(|e| MemoryError::unavailable(conversation_id, e))?;

        let active_units: BTreeSet<&UnitId> = active.iter().map(|r| &r.metadata.unit_id).collect();
        Ok(MemoryStats {
            active_units: active_units.len(),
            active_chunks: active.len(),
            archived_units,
        })
    }
}
