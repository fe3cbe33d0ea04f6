//! Shared test utilities for tiered-memory integration tests.
//!
//! Provides FaultyClient (CollectionClient) wrapping the in-memory client with
//! switches that make individual collection calls fail.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use embedding::{EmbeddingService, HashingEmbedding};
use memory_core::{CollectionClient, QueryHit, Record, RecordFilter, VectorCollection};
use memory_inmemory::{DuplicatePolicy, InMemoryClient};
use tiered_memory::{MemoryConfig, TieredMemory};

/// Failure switches shared by a client and every collection it hands out.
#[derive(Default)]
pub struct Faults {
    /// `add` writes the first record of the batch, then fails.
    pub add: AtomicBool,
    pub upsert: AtomicBool,
    pub get: AtomicBool,
    pub delete: AtomicBool,
    pub query: AtomicBool,
    pub heartbeat: AtomicBool,
    /// Limits collection faults to `*:archive` collections.
    pub archive_only: AtomicBool,
}

impl Faults {
    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), anyhow::Error> {
        if flag.load(Ordering::SeqCst) {
            anyhow::bail!("injected {} failure", op);
        }
        Ok(())
    }
}

pub struct FaultyCollection {
    inner: Arc<dyn VectorCollection>,
    faults: Arc<Faults>,
}

impl FaultyCollection {
    fn tripped(&self, flag: &AtomicBool) -> bool {
        if self.faults.archive_only.load(Ordering::SeqCst) && !self.inner.name().ends_with(":archive") {
            return false;
        }
        flag.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<(), anyhow::Error> {
        if self.tripped(flag) {
            anyhow::bail!("injected {} failure", op);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorCollection for FaultyCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn add(&self, mut records: Vec<Record>) -> Result<(), anyhow::Error> {
        if self.tripped(&self.faults.add) {
            records.truncate(1);
            self.inner.add(records).await?;
            anyhow::bail!("injected add failure");
        }
        self.inner.add(records).await
    }

    async fn upsert(&self, records: Vec<Record>) -> Result<(), anyhow::Error> {
        self.check(&self.faults.upsert, "upsert")?;
        self.inner.upsert(records).await
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryHit>, anyhow::Error> {
        self.check(&self.faults.query, "query")?;
        self.inner.query(text, limit).await
    }

    async fn get(&self, filter: &RecordFilter) -> Result<Vec<Record>, anyhow::Error> {
        self.check(&self.faults.get, "get")?;
        self.inner.get(filter).await
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, anyhow::Error> {
        self.check(&self.faults.delete, "delete")?;
        self.inner.delete(ids).await
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        self.inner.count().await
    }
}

#[derive(Clone)]
pub struct FaultyClient {
    pub inner: InMemoryClient,
    pub faults: Arc<Faults>,
}

impl FaultyClient {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            inner: InMemoryClient::with_duplicate_policy(policy),
            faults: Arc::new(Faults::default()),
        }
    }
}

#[async_trait]
impl CollectionClient for FaultyClient {
    async fn heartbeat(&self) -> Result<(), anyhow::Error> {
        Faults::check(&self.faults.heartbeat, "heartbeat")?;
        self.inner.heartbeat().await
    }

    async fn get_or_create_collection(
        &self,
        name: &str,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<Arc<dyn VectorCollection>, anyhow::Error> {
        let inner = self.inner.get_or_create_collection(name, embedder).await?;
        Ok(Arc::new(FaultyCollection {
            inner,
            faults: self.faults.clone(),
        }))
    }

    async fn delete_collection(&self, name: &str) -> Result<bool, anyhow::Error> {
        self.inner.delete_collection(name).await
    }
}

pub fn embedder() -> Arc<dyn EmbeddingService> {
    Arc::new(HashingEmbedding::new(128))
}

/// Small chunks so multi-chunk units stay short in tests.
pub fn test_config() -> MemoryConfig {
    MemoryConfig {
        chunk_size: 4,
        chunk_overlap: 1,
        ..MemoryConfig::default()
    }
}

/// An initialized memory over a fresh [`FaultyClient`].
pub async fn ready_memory(config: MemoryConfig, policy: DuplicatePolicy) -> (TieredMemory, FaultyClient) {
    let client = FaultyClient::new(policy);
    let memory = TieredMemory::new(config).expect("valid config");
    memory
        .initialize(Arc::new(client.clone()), embedder())
        .await
        .expect("initialize");
    (memory, client)
}
