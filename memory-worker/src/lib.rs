//! # memory-worker
//!
//! Process front end of the tiered memory: argument parsing, config loading,
//! logging, and the JSON-lines loop that feeds commands to a
//! [`tiered_memory::MemoryWorker`].

pub mod cli;
pub mod config;
pub mod logger;
pub mod serve;

pub use cli::{Cli, Commands};
pub use config::{build_embedder, WorkerConfig};
pub use logger::init_tracing;
pub use serve::{run_chunk, run_serve};
