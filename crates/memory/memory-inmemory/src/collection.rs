//! In-memory vector collection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use embedding::EmbeddingService;
use memory_core::{QueryHit, Record, RecordFilter, VectorCollection};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// What [`InMemoryCollection::add`] does with an id that is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Replace the stored record.
    #[default]
    Overwrite,
    /// Fail the add. Records of the batch before the duplicate stay written.
    Reject,
}

struct StoredRecord {
    seq: u64,
    record: Record,
    embedding: Vec<f32>,
}

#[derive(Default)]
struct Entries {
    next_seq: u64,
    records: HashMap<String, StoredRecord>,
}

impl Entries {
    fn insert(&mut self, record: Record, embedding: Vec<f32>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.insert(
            record.id.clone(),
            StoredRecord {
                seq,
                record,
                embedding,
            },
        );
    }
}

/// A named collection bound to one embedding service.
pub struct InMemoryCollection {
    name: String,
    embedder: Arc<dyn EmbeddingService>,
    duplicates: DuplicatePolicy,
    entries: RwLock<Entries>,
}

impl InMemoryCollection {
    /// Creates an empty collection.
    pub fn new(
        name: impl Into<String>,
        embedder: Arc<dyn EmbeddingService>,
        duplicates: DuplicatePolicy,
    ) -> Self {
        Self {
            name: name.into(),
            embedder,
            duplicates,
            entries: RwLock::new(Entries::default()),
        }
    }

    async fn embed_records(&self, records: &[Record]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != records.len() {
            anyhow::bail!(
                "embedding service returned {} vectors for {} records",
                embeddings.len(),
                records.len()
            );
        }
        Ok(embeddings)
    }
}

/// Cosine similarity of two vectors; 0.0 for empty or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[async_trait]
impl VectorCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, records), fields(collection = %self.name, count = records.len()))]
    async fn add(&self, records: Vec<Record>) -> Result<(), anyhow::Error> {
        let embeddings = self.embed_records(&records).await?;
        let mut entries = self.entries.write().await;
        for (record, embedding) in records.into_iter().zip(embeddings) {
            if self.duplicates == DuplicatePolicy::Reject && entries.records.contains_key(&record.id) {
                anyhow::bail!(
                    "record id '{}' already exists in collection '{}'",
                    record.id,
                    self.name
                );
            }
            entries.insert(record, embedding);
        }
        Ok(())
    }

    #[instrument(skip(self, records), fields(collection = %self.name, count = records.len()))]
    async fn upsert(&self, records: Vec<Record>) -> Result<(), anyhow::Error> {
        let embeddings = self.embed_records(&records).await?;
        let mut entries = self.entries.write().await;
        for (record, embedding) in records.into_iter().zip(embeddings) {
            entries.insert(record, embedding);
        }
        Ok(())
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryHit>, anyhow::Error> {
        if limit == 0 {
            return Ok(vec![]);
        }
        let query_embedding = self.embedder.embed(text).await?;
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, u64, &Record)> = entries
            .records
            .values()
            .map(|stored| {
                (
                    cosine_similarity(&query_embedding, &stored.embedding),
                    stored.seq,
                    &stored.record,
                )
            })
            .collect();

        // Ties fall back to insertion order so results are stable.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let hits: Vec<QueryHit> = scored
            .into_iter()
            .take(limit)
            .map(|(score, _, record)| QueryHit {
                record: record.clone(),
                score,
            })
            .collect();
        debug!(collection = %self.name, hits = hits.len(), "query done");
        Ok(hits)
    }

    async fn get(&self, filter: &RecordFilter) -> Result<Vec<Record>, anyhow::Error> {
        let entries = self.entries.read().await;
        let mut matched: Vec<&StoredRecord> = entries
            .records
            .values()
            .filter(|stored| filter.matches(&stored.record))
            .collect();
        matched.sort_by_key(|stored| stored.seq);
        Ok(matched.into_iter().map(|stored| stored.record.clone()).collect())
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, anyhow::Error> {
        let mut entries = self.entries.write().await;
        let removed = ids
            .iter()
            .filter(|id| entries.records.remove(id.as_str()).is_some())
            .count();
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        Ok(self.entries.read().await.records.len())
    }
}
