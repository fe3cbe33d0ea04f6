//! # Memory Core
//!
//! Core types and traits shared by the tiered memory manager and the vector
//! collection backends.
//!
//! ## Modules
//!
//! - [`types`] - UnitId, Record, RecordMetadata, RecordFilter, QueryHit
//! - [`store`] - VectorCollection and CollectionClient traits

pub mod store;
pub mod types;

pub use store::*;
pub use types::*;
