//! # Text Embeddings
//!
//! This crate defines the embedding service interface used by the memory stores to
//! turn text into vectors. Every collection of a conversation is bound to one
//! [`EmbeddingService`] instance so that similarity scores from the active and the
//! archive tier are comparable.
//!
//! ## Implementations
//!
//! - [`HashingEmbedding`] - deterministic, offline, bag-of-words feature hashing
//! - `openai-embedding` crate - OpenAI-compatible embeddings API

use async_trait::async_trait;

mod config;
mod hashing;

pub use config::{EmbeddingConfig, EmbeddingProvider};
pub use hashing::HashingEmbedding;

/// Service for generating text embeddings.
///
/// Implementations return fixed-length, L2-normalized vectors.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;

    /// Generates embedding vectors for multiple texts, one per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error>;
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
