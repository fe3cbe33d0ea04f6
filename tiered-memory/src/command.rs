//! Message boundary of the memory worker.
//!
//! Both enums serialize as JSON objects tagged by `"type"` in kebab-case, e.g.
//!
//! ```json
//! {"type":"add-to-memory","conversation_id":"c1","unit_id":3,"text":"..."}
//! {"type":"summarize-and-archive","conversation_id":"c1","unit_id":3,"full_text":"..."}
//! ```

use memory_core::UnitId;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::types::MemoryStats;

/// A request to the memory worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    AddToMemory {
        conversation_id: String,
        unit_id: UnitId,
        text: String,
    },
    GetContext {
        conversation_id: String,
        query: String,
        request_id: String,
        #[serde(default)]
        regeneration_instruction: Option<String>,
    },
    /// Completion of a `summarize-and-archive` request.
    ArchiveData {
        conversation_id: String,
        unit_id: UnitId,
        summary: String,
    },
    CreateCollection {
        conversation_id: String,
    },
    ClearCollection {
        conversation_id: String,
    },
    DeleteCollection {
        conversation_id: String,
    },
    GetStats {
        conversation_id: String,
    },
}

impl Command {
    pub fn conversation_id(&self) -> &str {
        match self {
            Command::AddToMemory { conversation_id, .. }
            | Command::GetContext { conversation_id, .. }
            | Command::ArchiveData { conversation_id, .. }
            | Command::CreateCollection { conversation_id }
            | Command::ClearCollection { conversation_id }
            | Command::DeleteCollection { conversation_id }
            | Command::GetStats { conversation_id } => conversation_id,
        }
    }
}

/// A message emitted by the memory worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    AddToMemoryDone {
        conversation_id: String,
        unit_id: UnitId,
        chunks: usize,
    },
    /// Asks the external summarizer for a summary; answered with `archive-data`.
    SummarizeAndArchive {
        conversation_id: String,
        unit_id: UnitId,
        full_text: String,
    },
    ContextRetrieved {
        conversation_id: String,
        context: String,
        request_id: String,
        regeneration_instruction: Option<String>,
    },
    CollectionReady {
        conversation_id: String,
    },
    CollectionCleared {
        conversation_id: String,
    },
    CollectionDeleted {
        conversation_id: String,
    },
    Stats {
        conversation_id: String,
        #[serde(flatten)]
        stats: MemoryStats,
    },
    Log {
        message: String,
    },
    Error {
        message: String,
        conversation_id: Option<String>,
        unit_id: Option<UnitId>,
    },
}

impl Event {
    pub fn log(message: impl Into<String>) -> Self {
        Event::Log {
            message: message.into(),
        }
    }

    pub fn from_error(error: &MemoryError) -> Self {
        Event::Error {
            message: error.to_string(),
            conversation_id: error.conversation_id().map(str::to_string),
            unit_id: error.unit_id().cloned(),
        }
    }
}
