//! Retriever: queries both tiers and merges the hits into one context string.
//!
//! Archive summaries come first, each wrapped in the summary marker, followed by
//! active chunks in the order the store ranked them. Entries are deduplicated on
//! their final text, first occurrence wins, then joined with the separator.

use std::collections::HashSet;
use std::sync::Arc;

use memory_core::{QueryHit, VectorCollection};
use tracing::{debug, instrument};

use crate::collections::CollectionResolver;
use crate::error::{MemoryError, Result};

/// How many hits to take from each tier and how to format them.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    pub active_results: usize,
    pub archive_results: usize,
    pub summary_marker: String,
    pub separator: String,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            active_results: 5,
            archive_results: 2,
            summary_marker: "Past summary".to_string(),
            separator: "\n---\n".to_string(),
        }
    }
}

/// Builds the context string from ranked archive and active texts.
pub fn merge_context<'a>(
    archive: impl IntoIterator<Item = &'a str>,
    active: impl IntoIterator<Item = &'a str>,
    options: &RetrievalOptions,
) -> String {
    let wrapped = archive
        .into_iter()
        .map(|text| format!("[{}: {}]", options.summary_marker, text));
    let entries = wrapped.chain(active.into_iter().map(str::to_string));

    let mut seen = HashSet::new();
    let unique: Vec<String> = entries.filter(|e| seen.insert(e.clone())).collect();
    unique.join(&options.separator)
}

#[instrument(skip(resolver, options, query), fields(query_len = query.len()))]
pub(crate) async fn get_context(
    resolver: &CollectionResolver,
    options: &RetrievalOptions,
    conversation_id: &str,
    query: &str,
) -> Result<String> {
    let stores = resolver.resolve(conversation_id).await?;

    let (active_hits, archive_hits) = tokio::join!(
        query_tier(&stores.active, query, options.active_results),
        query_tier(&stores.archive, query, options.archive_results),
    );
    let active_hits = active_hits.map_err(|e| MemoryError::unavailable(conversation_id, e))?;
    let archive_hits = archive_hits.map_err(|e| MemoryError::unavailable(conversation_id, e))?;
    debug!(
        active = active_hits.len(),
        archive = archive_hits.len(),
        "tiers queried"
    );

    Ok(merge_context(
        archive_hits.iter().map(|hit| hit.record.text.as_str()),
        active_hits.iter().map(|hit| hit.record.text.as_str()),
        options,
    ))
}

/// A zero limit skips the store call.
async fn query_tier(
    collection: &Arc<dyn VectorCollection>,
    query: &str,
    limit: usize,
) -> anyhow::Result<Vec<QueryHit>> {
    if limit == 0 {
        return Ok(vec![]);
    }
    collection.query(query, limit).await
}
