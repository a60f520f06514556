use crate::storage::StoreError;
use crate::types::{BoardId, CardId, ColumnId, TagId};

/// Input rejected before any write is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Card title must not be empty")]
    EmptyTitle,

    #[error("Invalid color {0:?}: expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("Tag name must not be empty")]
    EmptyTagName,

    #[error("Tag name is {len} characters long (max {max})")]
    TagNameTooLong { len: usize, max: usize },

    #[error("Column name must not be empty")]
    EmptyColumnName,

    #[error("Column name {0:?} is reserved")]
    ReservedColumnName(String),
}

/// Failure of a board operation as seen by its caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("Board not found: {0}")]
    BoardNotFound(BoardId),

    #[error("Column not found: {0}")]
    ColumnNotFound(ColumnId),

    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("Tag not found: {0}")]
    TagNotFound(TagId),
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, EngineError::Persistence(_))
    }
}
