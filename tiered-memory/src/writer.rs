//! Active-memory writer: chunks unit text and appends it to the active tier.
//!
//! Chunk ids are derived from the unit id and chunk index, so a write can be
//! repeated. A write replaces the unit's chunks as a whole:
//! 1. snapshot the unit's current chunks
//! 2. delete them together with the new ids (clears leftovers of a failed
//!    attempt and keeps duplicate-rejecting stores from failing the retry)
//! 3. add the new batch
//!
//! If step 3 fails, the partial batch is removed and the snapshot is upserted
//! back, so a failed write leaves the unit as it was.
//!
//! Writing a unit that already has an archive summary reopens it: the summary is
//! removed once the new chunks are committed. That step is best effort; if it
//! fails the unit holds both chunks and summary until the next write of it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use memory_core::{Record, RecordFilter, UnitId, VectorCollection};
use tracing::{debug, error, info, instrument, warn};

use crate::chunker::Chunker;
use crate::collections::CollectionResolver;
use crate::error::{MemoryError, Result};
use crate::types::{Chunk, Summary, WriteAck};

#[instrument(skip(resolver, chunker, text), fields(text_len = text.len()))]
pub(crate) async fn add_to_memory(
    resolver: &CollectionResolver,
    chunker: &Chunker,
    conversation_id: &str,
    unit_id: &UnitId,
    text: &str,
) -> Result<WriteAck> {
    let stores = resolver.resolve(conversation_id).await?;

    if text.trim().is_empty() {
        debug!("empty text, nothing to write");
        return Ok(WriteAck {
            unit_id: unit_id.clone(),
            chunks: 0,
        });
    }

    let written_at = Utc::now();
    let chunks: Vec<Chunk> = chunker
        .chunk(text)
        .into_iter()
        .enumerate()
        .map(|(index, window)| Chunk::new(unit_id.clone(), index, window, written_at))
        .collect();
    let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
    let count = chunks.len();
    let failed = |e: anyhow::Error| MemoryError::write_failed(conversation_id, unit_id, e);

    let previous = stores
        .active
        .get(&RecordFilter::Unit(unit_id.clone()))
        .await
        .map_err(failed)?;

    let mut clear: Vec<String> = ids.clone();
    let new_ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
    clear.extend(
        previous
            .iter()
            .filter(|r| !new_ids.contains(r.id.as_str()))
            .map(|r| r.id.clone()),
    );
    let replaced = stores.active.delete(&clear).await.map_err(failed)?;
    if replaced > 0 {
        debug!(replaced, "cleared earlier chunks of the unit");
    }

    let records = chunks.into_iter().map(Chunk::into_record).collect();
    if let Err(e) = stores.active.add(records).await {
        warn!(error = %e, "active add failed, restoring previous chunks");
        restore(&stores.active, &ids, previous).await;
        return Err(failed(e));
    }

    if let Err(e) = reopen_if_archived(&stores.archive, unit_id).await {
        warn!(
            error = %e,
            %unit_id,
            "chunks written but summary not removed; next write of the unit retries"
        );
    }

    info!(chunks = count, "unit written to active memory");
    Ok(WriteAck {
        unit_id: unit_id.clone(),
        chunks: count,
    })
}

/// Removes the partial batch `ids` and writes `previous` back.
async fn restore(active: &Arc<dyn VectorCollection>, ids: &[String], previous: Vec<Record>) {
    if let Err(e) = active.delete(ids).await {
        warn!(error = %e, "could not remove partial batch");
    }
    if previous.is_empty() {
        return;
    }
    let restored = previous.len();
    match active.upsert(previous).await {
        Ok(()) => debug!(restored, "previous chunks restored"),
        Err(e) => error!(error = %e, restored, "could not restore previous chunks"),
    }
}

async fn reopen_if_archived(
    archive: &Arc<dyn VectorCollection>,
    unit_id: &UnitId,
) -> anyhow::Result<()> {
    let summary_id = Summary::id_for(unit_id);
    let existing = archive
        .get(&RecordFilter::Ids(vec![summary_id.clone()]))
        .await?;
    if existing.is_empty() {
        return Ok(());
    }

    archive.delete(&[summary_id]).await?;
    info!(%unit_id, "archived unit reopened, summary removed");
    Ok(())
}
