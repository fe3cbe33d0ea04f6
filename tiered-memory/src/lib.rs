//! # Tiered memory
//!
//! Long-term memory for long-running conversations, kept in two tiers per
//! conversation:
//!
//! - **active**: recent units stored verbatim as overlapping word chunks
//! - **archive**: one summary per unit that was moved out of the active tier
//!
//! When a conversation holds more units than the configured ceiling, the
//! oldest ones are handed to an external summarizer
//! ([`Event::SummarizeAndArchive`]); the summary comes back through
//! [`Command::ArchiveData`] and replaces the unit's chunks. Retrieval queries
//! both tiers and merges the hits into one context string.
//!
//! [`TieredMemory`] exposes the operations directly; [`MemoryWorker`] runs them
//! behind a per-conversation command queue.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use embedding::HashingEmbedding;
//! use memory_core::UnitId;
//! use memory_inmemory::InMemoryClient;
//! use tiered_memory::{MemoryConfig, TieredMemory};
//!
//! # tokio_test::block_on(async {
//! let memory = TieredMemory::new(MemoryConfig::default()).unwrap();
//! memory
//!     .initialize(Arc::new(InMemoryClient::new()), Arc::new(HashingEmbedding::default()))
//!     .await
//!     .unwrap();
//!
//! memory.add_to_memory("c1", &UnitId::from(1u64), "The dragon slept under the hill").await.unwrap();
//! let context = memory.get_context("c1", "dragon").await.unwrap();
//! assert_eq!(context, "The dragon slept under the hill");
//! # });
//! ```

mod archiver;
pub mod chunker;
pub mod collections;
pub mod command;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod memory;
pub mod retriever;
pub mod types;
pub mod worker;
mod writer;

pub use chunker::Chunker;
pub use collections::{CollectionResolver, ConversationStores};
pub use command::{Command, Event};
pub use config::MemoryConfig;
pub use error::{MemoryError, Result};
pub use maintenance::{select_for_archival, MaintenancePolicy};
pub use memory::TieredMemory;
pub use retriever::{merge_context, RetrievalOptions};
pub use types::{
    ArchivalRequest, ArchiveAck, Chunk, CollectionStatus, MaintenanceOutcome, MemoryStats,
    Summary, WriteAck,
};
pub use worker::MemoryWorker;
