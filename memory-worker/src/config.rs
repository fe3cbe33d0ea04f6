//! Worker configuration: memory policy, embedding backend, log file.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use embedding::{EmbeddingConfig, EmbeddingProvider, EmbeddingService, HashingEmbedding};
use openai_embedding::OpenAIEmbedding;
use tiered_memory::MemoryConfig;
use tracing::info;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub memory: MemoryConfig,
    pub embedding: EmbeddingConfig,
    /// Optional log file (MEMORY_LOG_FILE).
    pub log_file: Option<String>,
}

impl WorkerConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            memory: MemoryConfig::from_env().context("memory settings")?,
            embedding: EmbeddingConfig::from_env().context("embedding settings")?,
            log_file: env::var("MEMORY_LOG_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.memory.validate()?;
        self.embedding.validate()?;
        Ok(())
    }
}

/// Builds the embedding service every collection of the worker is bound to.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingService>> {
    match config.provider {
        EmbeddingProvider::Hashing => {
            info!(dimension = config.dimension, "using hashing embeddings");
            Ok(Arc::new(HashingEmbedding::new(config.dimension)))
        }
        EmbeddingProvider::OpenAI => {
            if config.openai_api_key.is_empty() {
                anyhow::bail!("EMBEDDING_PROVIDER=openai requires OPENAI_API_KEY to be set");
            }
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| openai_embedding::DEFAULT_MODEL.to_string());
            info!(model = %model, "using OpenAI embeddings");
            Ok(Arc::new(OpenAIEmbedding::new_with_base_url(
                config.openai_api_key.clone(),
                model,
                config.openai_base_url.as_deref(),
            )))
        }
    }
}
