//! # In-Memory Vector Collections
//!
//! Reference implementation of [`memory_core::CollectionClient`] and
//! [`memory_core::VectorCollection`] that keeps everything in RAM.
//!
//! **Advantages**:
//! - No I/O, no external service
//! - Deterministic ordering, handy for tests
//!
//! **Limitations**:
//! - Data is lost on restart
//! - Similarity search is a linear scan
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use embedding::HashingEmbedding;
//! use memory_core::{CollectionClient, VectorCollection};
//! use memory_inmemory::InMemoryClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), anyhow::Error> {
//!     let client = InMemoryClient::new();
//!     let collection = client
//!         .get_or_create_collection("story:active", Arc::new(HashingEmbedding::default()))
//!         .await?;
//!     assert_eq!(collection.count().await?, 0);
//!     Ok(())
//! }
//! ```
//!
//! ## Thread Safety
//!
//! Collections and the client use `tokio::sync::RwLock`; embeddings are computed
//! before any lock is taken.

mod client;
mod collection;

pub use client::InMemoryClient;
pub use collection::{cosine_similarity, DuplicatePolicy, InMemoryCollection};
