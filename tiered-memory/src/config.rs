//! Memory policy configuration, loaded from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Tunables of chunking, maintenance and retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Words per chunk (MEMORY_CHUNK_SIZE).
    pub chunk_size: usize,
    /// Words shared by consecutive chunks (MEMORY_CHUNK_OVERLAP); must be below `chunk_size`.
    pub chunk_overlap: usize,
    /// Distinct units allowed in the active tier before archiving (MEMORY_MAX_ACTIVE_UNITS).
    pub max_active_units: usize,
    /// Units requested for archival per maintenance pass (MEMORY_ARCHIVE_BATCH_SIZE).
    pub archive_batch_size: usize,
    /// Active-tier hits per context request (MEMORY_ACTIVE_RESULTS).
    pub active_results: usize,
    /// Archive-tier hits per context request (MEMORY_ARCHIVE_RESULTS).
    pub archive_results: usize,
    /// Label wrapped around archived summaries in the context (MEMORY_SUMMARY_MARKER).
    pub summary_marker: String,
    /// Separator between context entries (MEMORY_CONTEXT_SEPARATOR, `\n` escapes decoded).
    pub context_separator: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chunk_size: 250,
            chunk_overlap: 50,
            max_active_units: 20,
            archive_batch_size: 1,
            active_results: 5,
            archive_results: 2,
            summary_marker: "Past summary".to_string(),
            context_separator: "\n---\n".to_string(),
        }
    }
}

impl MemoryConfig {
    /// Load from environment variables; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            chunk_size: env_number("MEMORY_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: env_number("MEMORY_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            max_active_units: env_number("MEMORY_MAX_ACTIVE_UNITS", defaults.max_active_units)?,
            archive_batch_size: env_number(
                "MEMORY_ARCHIVE_BATCH_SIZE",
                defaults.archive_batch_size,
            )?,
            active_results: env_number("MEMORY_ACTIVE_RESULTS", defaults.active_results)?,
            archive_results: env_number("MEMORY_ARCHIVE_RESULTS", defaults.archive_results)?,
            summary_marker: env::var("MEMORY_SUMMARY_MARKER")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.summary_marker),
            context_separator: env::var("MEMORY_CONTEXT_SEPARATOR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| s.replace("\\n", "\n"))
                .unwrap_or(defaults.context_separator),
        })
    }

    /// Rejects values that would make chunking or maintenance ill-defined.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("MEMORY_CHUNK_SIZE must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            anyhow::bail!(
                "MEMORY_CHUNK_OVERLAP ({}) must be smaller than MEMORY_CHUNK_SIZE ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.archive_batch_size == 0 {
            anyhow::bail!("MEMORY_ARCHIVE_BATCH_SIZE must be at least 1");
        }
        Ok(())
    }
}

fn env_number<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid number: '{}'", key, raw)),
        _ => Ok(default),
    }
}
