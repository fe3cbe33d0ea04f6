//! Domain records of the two tiers and the acknowledgements operations return.

use chrono::{DateTime, Utc};
use memory_core::{Record, RecordMetadata, UnitId};
use serde::{Deserialize, Serialize};

/// A word window of one unit, stored in the active tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub unit_id: UnitId,
    pub index: usize,
    pub written_at: DateTime<Utc>,
}

impl Chunk {
    pub fn new(unit_id: UnitId, index: usize, text: String, written_at: DateTime<Utc>) -> Self {
        Self {
            id: Self::id_for(&unit_id, index),
            text,
            unit_id,
            index,
            written_at,
        }
    }

    /// `unit:<unitId>:chunk:<index>`
    pub fn id_for(unit_id: &UnitId, index: usize) -> String {
        format!("unit:{}:chunk:{}", unit_id, index)
    }

    pub fn into_record(self) -> Record {
        Record {
            id: self.id,
            text: self.text,
            metadata: RecordMetadata {
                unit_id: self.unit_id,
                chunk_index: Some(self.index),
                written_at: self.written_at,
            },
        }
    }
}

/// Condensed text of one archived unit, stored in the archive tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub id: String,
    pub text: String,
    pub unit_id: UnitId,
    pub created_at: DateTime<Utc>,
}

impl Summary {
    pub fn new(unit_id: UnitId, text: String) -> Self {
        Self {
            id: Self::id_for(&unit_id),
            text,
            unit_id,
            created_at: Utc::now(),
        }
    }

    /// `summary:<unitId>`
    pub fn id_for(unit_id: &UnitId) -> String {
        format!("summary:{}", unit_id)
    }

    pub fn into_record(self) -> Record {
        Record {
            id: self.id,
            text: self.text,
            metadata: RecordMetadata {
                unit_id: self.unit_id,
                chunk_index: None,
                written_at: self.created_at,
            },
        }
    }
}

/// Result of a successful write. `chunks` is 0 for empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub unit_id: UnitId,
    pub chunks: usize,
}

/// Result of a successful archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveAck {
    pub unit_id: UnitId,
    pub removed_chunks: usize,
}

/// Request to summarize a unit; answered later by an archive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivalRequest {
    pub conversation_id: String,
    pub unit_id: UnitId,
    pub full_text: String,
}

/// What one maintenance pass decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceOutcome {
    /// The active tier is empty.
    Idle,
    /// At or below the ceiling; nothing to archive.
    WithinCeiling { active_units: usize },
    /// Summaries were requested; the units stay active until archived.
    SummarizationPending(Vec<ArchivalRequest>),
}

/// Whether a drop found anything to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Dropped,
    /// Neither tier existed; not an error.
    Absent,
}

/// Tier occupancy of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub active_units: usize,
    pub active_chunks: usize,
    pub archived_units: usize,
}
