//! Deterministic local embedder based on feature hashing.
//!
//! Each lowercase alphanumeric token is hashed (FNV-1a) into one of `dimension`
//! buckets with a hash-derived sign, and the bucket counts are L2-normalized.
//! Texts sharing words therefore score higher under cosine similarity. Used by
//! tests and by the worker when no remote embedding provider is configured.

use async_trait::async_trait;
use tracing::debug;

use crate::{normalize, EmbeddingService};

/// Default vector length of [`HashingEmbedding`].
pub const DEFAULT_HASHING_DIMENSION: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bag-of-words hashing embedder. Needs no network and no model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    /// Creates an embedder producing vectors of `dimension` floats.
    ///
    /// A zero dimension is bumped to 1 so every vector has a defined length.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Vector length produced by this embedder.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let hash = fnv1a(&token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingService for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        debug!(
            batch_size = texts.len(),
            dimension = self.dimension,
            "hashing embed_batch"
        );
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
