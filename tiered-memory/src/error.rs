use memory_core::UnitId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Memory is not initialized")]
    NotInitialized,

    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        conversation_id: Option<String>,
        message: String,
    },

    #[error("Write failed for unit {unit_id}: {message}")]
    WriteFailed {
        conversation_id: String,
        unit_id: UnitId,
        message: String,
    },

    /// The summary is committed but the unit's chunks could not be removed.
    /// Re-invoking archive with the same arguments completes it.
    #[error("Archive of unit {unit_id} incomplete: {message}")]
    ArchiveIncomplete {
        conversation_id: String,
        unit_id: UnitId,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MemoryError {
    pub(crate) fn unavailable(conversation_id: &str, source: anyhow::Error) -> Self {
        MemoryError::StoreUnavailable {
            conversation_id: Some(conversation_id.to_string()),
            message: format!("{:#}", source),
        }
    }

    pub(crate) fn write_failed(conversation_id: &str, unit_id: &UnitId, source: anyhow::Error) -> Self {
        MemoryError::WriteFailed {
            conversation_id: conversation_id.to_string(),
            unit_id: unit_id.clone(),
            message: format!("{:#}", source),
        }
    }

    /// Conversation the failed operation belonged to, if any.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            MemoryError::StoreUnavailable { conversation_id, .. } => conversation_id.as_deref(),
            MemoryError::WriteFailed { conversation_id, .. }
            | MemoryError::ArchiveIncomplete { conversation_id, .. } => Some(conversation_id),
            MemoryError::NotInitialized | MemoryError::InvalidConfig(_) => None,
        }
    }

    /// Unit the failed operation concerned, if any.
    pub fn unit_id(&self) -> Option<&UnitId> {
        match self {
            MemoryError::WriteFailed { unit_id, .. }
            | MemoryError::ArchiveIncomplete { unit_id, .. } => Some(unit_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
