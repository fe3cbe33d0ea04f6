//! Archiver: commits a unit's summary, then removes the unit's chunks.
//!
//! Steps run strictly in order, each awaited:
//! 1. upsert `summary:<unitId>` into the archive tier
//! 2. list the unit's chunk ids in the active tier
//! 3. delete them
//!
//! A failure after step 1 leaves the unit in both tiers, never in neither.
//! Because step 1 overwrites by id, calling archive again with the same
//! arguments finishes the job.

use memory_core::{RecordFilter, UnitId};
use tracing::{info, instrument, warn};

use crate::collections::CollectionResolver;
use crate::error::{MemoryError, Result};
use crate::types::{ArchiveAck, Summary};

#[instrument(skip(resolver, summary), fields(summary_len = summary.len()))]
pub(crate) async fn archive(
    resolver: &CollectionResolver,
    conversation_id: &str,
    unit_id: &UnitId,
    summary: &str,
) -> Result<ArchiveAck> {
    let stores = resolver.resolve(conversation_id).await?;

    let record = Summary::new(unit_id.clone(), summary.to_string()).into_record();
    stores
        .archive
        .upsert(vec![record])
        .await
        .map_err(|e| MemoryError::write_failed(conversation_id, unit_id, e))?;

    let incomplete = |e: anyhow::Error| {
        warn!(error = %e, "summary committed but chunks remain");
        MemoryError::ArchiveIncomplete {
            conversation_id: conversation_id.to_string(),
            unit_id: unit_id.clone(),
            message: format!("{:#}", e),
        }
    };

    let ids: Vec<String> = stores
        .active
        .get(&RecordFilter::Unit(unit_id.clone()))
        .await
        .map_err(incomplete)?
        .into_iter()
        .map(|r| r.id)
        .collect();

    let removed_chunks = if ids.is_empty() {
        0
    } else {
        stores.active.delete(&ids).await.map_err(incomplete)?
    };

    info!(removed_chunks, "unit archived");
    Ok(ArchiveAck {
        unit_id: unit_id.clone(),
        removed_chunks,
    })
}
