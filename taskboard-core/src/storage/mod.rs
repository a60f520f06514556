pub mod dataset;
pub mod local;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::types::*;

/// Persistence contract the engine depends on.
/// Implementations: MemoryStore (process-local), JsonFileStore (single file on disk).
///
/// Batched writes are all-or-nothing from the caller's point of view.
/// No concurrency token is checked: a write the store accepts wins.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError>;

    async fn fetch_board(&self, board_id: BoardId) -> Result<Option<Board>, StoreError>;

    async fn insert_board(&self, board: NewBoard) -> Result<Board, StoreError>;

    /// All columns of a board, backlog included, ordered by position.
    async fn list_columns(&self, board_id: BoardId) -> Result<Vec<Column>, StoreError>;

    /// Columns matching any of `ids`, in one lookup. Unknown ids are skipped.
    async fn fetch_columns(&self, ids: &[ColumnId]) -> Result<Vec<Column>, StoreError>;

    async fn insert_column(&self, column: NewColumn) -> Result<Column, StoreError>;

    async fn rename_column(&self, id: ColumnId, name: &str) -> Result<Column, StoreError>;

    async fn delete_column(&self, id: ColumnId) -> Result<(), StoreError>;

    /// Cards in any of `column_ids` joined with their tags, ordered by position.
    async fn list_cards(&self, column_ids: &[ColumnId]) -> Result<Vec<CardWithTags>, StoreError>;

    async fn insert_card(&self, card: NewCard) -> Result<Card, StoreError>;

    async fn update_card(&self, id: CardId, patch: CardPatch) -> Result<Card, StoreError>;

    /// Set column and position for every listed card, or none of them.
    async fn update_card_placements(&self, placements: &[CardPlacement]) -> Result<(), StoreError>;

    async fn delete_card(&self, id: CardId) -> Result<(), StoreError>;

    async fn delete_cards_in_column(&self, column_id: ColumnId) -> Result<(), StoreError>;

    /// Board tags ordered by name.
    async fn list_tags(&self, board_id: BoardId) -> Result<Vec<Tag>, StoreError>;

    async fn insert_tag(&self, tag: NewTag) -> Result<Tag, StoreError>;

    /// Removes the tag and every association that references it.
    async fn delete_tag(&self, id: TagId) -> Result<(), StoreError>;

    async fn card_tag_ids(&self, card_id: CardId) -> Result<Vec<TagId>, StoreError>;

    /// Bulk insert. An empty slice must be a no-op.
    async fn insert_card_tags(&self, pairs: &[CardTagAssociation]) -> Result<(), StoreError>;

    async fn delete_card_tags(&self, card_id: CardId) -> Result<(), StoreError>;

    async fn append_history(&self, entry: NewHistory) -> Result<CardHistory, StoreError>;

    /// History for one card, oldest first.
    async fn list_history(&self, card_id: CardId) -> Result<Vec<CardHistory>, StoreError>;
}

/// Resolve column ids to names through a single `fetch_columns` call.
pub async fn column_names(
    store: &dyn BoardStore,
    ids: &[ColumnId],
) -> Result<HashMap<ColumnId, String>, StoreError> {
    Ok(store
        .fetch_columns(ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
