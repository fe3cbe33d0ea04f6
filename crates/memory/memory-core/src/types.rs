//! # Core Types
//!
//! ## UnitId
//!
//! Identifier of a unit (a chapter or message), the granularity at which text moves
//! from the active tier to the archive tier. Unit ids are ordered so that "oldest
//! first" is well defined:
//!
//! - numbers compare numerically (`9 < 10`)
//! - names compare lexicographically
//! - every number sorts before every name
//!
//! In JSON a unit id is a bare number or a bare string.
//!
//! ```rust
//! use memory_core::UnitId;
//!
//! assert!(UnitId::from(9) < UnitId::from(10));
//! assert!(UnitId::from(10) < UnitId::from("epilogue"));
//! ```
//!
//! ## Record
//!
//! What a vector collection stores: an id unique within the collection, the text
//! that gets embedded, and [`RecordMetadata`].
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `unit_id` | `UnitId` | Unit the record belongs to |
//! | `chunk_index` | `Option<usize>` | Position of a chunk inside its unit; `None` for summaries |
//! | `written_at` | `DateTime<Utc>` | When the record was written |

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Orderable identifier of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitId {
    Number(u64),
    Name(String),
}

impl Ord for UnitId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (UnitId::Number(a), UnitId::Number(b)) => a.cmp(b),
            (UnitId::Number(_), UnitId::Name(_)) => Ordering::Less,
            (UnitId::Name(_), UnitId::Number(_)) => Ordering::Greater,
            (UnitId::Name(a), UnitId::Name(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for UnitId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Number(n) => write!(f, "{}", n),
            UnitId::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for UnitId {
    fn from(n: u64) -> Self {
        UnitId::Number(n)
    }
}

impl From<&str> for UnitId {
    fn from(name: &str) -> Self {
        UnitId::Name(name.to_string())
    }
}

impl From<String> for UnitId {
    fn from(name: String) -> Self {
        UnitId::Name(name)
    }
}

/// Metadata attached to every stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub unit_id: UnitId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    pub written_at: DateTime<Utc>,
}

/// A single stored item of a vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub text: String,
    pub metadata: RecordMetadata,
}

/// Selects records for [`crate::VectorCollection::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFilter {
    /// Every record of the collection.
    All,
    /// Records whose metadata names this unit.
    Unit(UnitId),
    /// Records with one of these ids; unknown ids are ignored.
    Ids(Vec<String>),
}

impl RecordFilter {
    /// Returns true if `record` passes the filter.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Unit(unit_id) => &record.metadata.unit_id == unit_id,
            RecordFilter::Ids(ids) => ids.iter().any(|id| id == &record.id),
        }
    }
}

/// One similarity query result. Higher `score` means more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub record: Record,
    pub score: f32,
}
