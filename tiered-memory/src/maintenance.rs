//! Maintenance scheduler: decides which units leave the active tier.
//!
//! A pass scans active metadata, counts distinct units and, when the count is over
//! the ceiling, asks for the oldest units to be summarized. It never deletes:
//! chunks stay active until [`crate::archiver`] commits the summary. Units that
//! already have a summary (an archive interrupted after its first step) count as
//! archived and are not requested again.

use std::collections::{BTreeSet, HashSet};

use memory_core::{RecordFilter, UnitId};
use tracing::{debug, info, instrument, warn};

use crate::collections::CollectionResolver;
use crate::error::{MemoryError, Result};
use crate::types::{ArchivalRequest, MaintenanceOutcome, Summary};

/// Thresholds of a maintenance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenancePolicy {
    /// Distinct active units tolerated before archiving starts.
    pub max_active_units: usize,
    /// Upper bound of units requested per pass.
    pub batch_size: usize,
}

impl Default for MaintenancePolicy {
    fn default() -> Self {
        Self {
            max_active_units: 20,
            batch_size: 1,
        }
    }
}

/// Oldest-first units over the ceiling, at most `batch_size` of them.
/// `resident` must be sorted ascending.
pub fn select_for_archival(resident: &[UnitId], policy: &MaintenancePolicy) -> Vec<UnitId> {
    if resident.len() <= policy.max_active_units {
        return vec![];
    }
    let excess = resident.len() - policy.max_active_units;
    resident
        .iter()
        .take(excess.min(policy.batch_size))
        .cloned()
        .collect()
}

#[instrument(skip(resolver, policy))]
pub(crate) async fn run_maintenance(
    resolver: &CollectionResolver,
    policy: &MaintenancePolicy,
    conversation_id: &str,
) -> Result<MaintenanceOutcome> {
    let stores = resolver.resolve(conversation_id).await?;
    let unavailable = |e: anyhow::Error| MemoryError::unavailable(conversation_id, e);

    let items = stores.active.get(&RecordFilter::All).await.map_err(unavailable)?;
    if items.is_empty() {
        debug!("active tier empty");
        return Ok(MaintenanceOutcome::Idle);
    }

    let units: BTreeSet<UnitId> = items.into_iter().map(|r| r.metadata.unit_id).collect();
    let summary_ids: Vec<String> = units.iter().map(Summary::id_for).collect();
    let archived: HashSet<UnitId> = stores
        .archive
        .get(&RecordFilter::Ids(summary_ids))
        .await
        .map_err(unavailable)?
        .into_iter()
        .map(|r| r.metadata.unit_id)
        .collect();
    if !archived.is_empty() {
        warn!(
            units = ?archived,
            "units hold both chunks and a summary; waiting for archive retry"
        );
    }

    let resident: Vec<UnitId> = units
        .into_iter()
        .filter(|unit| !archived.contains(unit))
        .collect();
    let selected = select_for_archival(&resident, policy);
    if selected.is_empty() {
        debug!(active_units = resident.len(), "within ceiling");
        return Ok(MaintenanceOutcome::WithinCeiling {
            active_units: resident.len(),
        });
    }

    let mut requests = Vec::with_capacity(selected.len());
    for unit_id in selected {
        let mut chunks = stores
            .active
            .get(&RecordFilter::Unit(unit_id.clone()))
            .await
            .map_err(unavailable)?;
        chunks.sort_by_key(|r| r.metadata.chunk_index.unwrap_or(0));
        let full_text = chunks
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        info!(
            %unit_id,
            chunks = chunks.len(),
            active_units = resident.len(),
            "requesting summary for archival"
        );
        requests.push(ArchivalRequest {
            conversation_id: conversation_id.to_string(),
            unit_id,
            full_text,
        });
    }

    Ok(MaintenanceOutcome::SummarizationPending(requests))
}
