/// In-memory store.
///
/// Holds a `Dataset` behind a lock. Individual operations can be told to
/// fail, and every call is counted, so the engine's recovery paths can be
/// exercised without a real backend.
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use super::dataset::Dataset;
use super::{BoardStore, StoreError};
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListBoards,
    FetchBoard,
    InsertBoard,
    ListColumns,
    FetchColumns,
    InsertColumn,
    RenameColumn,
    DeleteColumn,
    ListCards,
    InsertCard,
    UpdateCard,
    UpdateCardPlacements,
    DeleteCard,
    DeleteCardsInColumn,
    ListTags,
    InsertTag,
    DeleteTag,
    CardTagIds,
    InsertCardTags,
    DeleteCardTags,
    AppendHistory,
    ListHistory,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
    failing: Mutex<HashSet<StoreOp>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(data: Dataset) -> Self {
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Make every subsequent call of `op` fail until cleared.
    pub fn fail_on(&self, op: StoreOp) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(op);
    }

    pub fn clear_failures(&self) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// How many times `op` has been called, failed calls included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    pub fn dataset(&self) -> Dataset {
        self.data.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn enter(&self, op: StoreOp) -> Result<(), StoreError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(op)
            .or_insert(0) += 1;
        if self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&op)
        {
            return Err(StoreError::Unavailable(format!("injected failure on {:?}", op)));
        }
        Ok(())
    }

    fn read<R>(&self, op: StoreOp, f: impl FnOnce(&Dataset) -> R) -> Result<R, StoreError> {
        self.enter(op)?;
        Ok(f(&self.data.read().unwrap_or_else(|e| e.into_inner())))
    }

    fn write<R>(
        &self,
        op: StoreOp,
        f: impl FnOnce(&mut Dataset) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        self.enter(op)?;
        f(&mut self.data.write().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        self.read(StoreOp::ListBoards, |d| d.list_boards())
    }

    async fn fetch_board(&self, board_id: BoardId) -> Result<Option<Board>, StoreError> {
        self.read(StoreOp::FetchBoard, |d| d.fetch_board(board_id))
    }

    async fn insert_board(&self, board: NewBoard) -> Result<Board, StoreError> {
        self.write(StoreOp::InsertBoard, |d| Ok(d.insert_board(board)))
    }

    async fn list_columns(&self, board_id: BoardId) -> Result<Vec<Column>, StoreError> {
        self.read(StoreOp::ListColumns, |d| d.list_columns(board_id))
    }

    async fn fetch_columns(&self, ids: &[ColumnId]) -> Result<Vec<Column>, StoreError> {
        self.read(StoreOp::FetchColumns, |d| d.fetch_columns(ids))
    }

    async fn insert_column(&self, column: NewColumn) -> Result<Column, StoreError> {
        self.write(StoreOp::InsertColumn, |d| d.insert_column(column))
    }

    async fn rename_column(&self, id: ColumnId, name: &str) -> Result<Column, StoreError> {
        self.write(StoreOp::RenameColumn, |d| d.rename_column(id, name))
    }

    async fn delete_column(&self, id: ColumnId) -> Result<(), StoreError> {
        self.write(StoreOp::DeleteColumn, |d| d.delete_column(id))
    }

    async fn list_cards(&self, column_ids: &[ColumnId]) -> Result<Vec<CardWithTags>, StoreError> {
        self.read(StoreOp::ListCards, |d| d.list_cards(column_ids))
    }

    async fn insert_card(&self, card: NewCard) -> Result<Card, StoreError> {
        self.write(StoreOp::InsertCard, |d| d.insert_card(card))
    }

    async fn update_card(&self, id: CardId, patch: CardPatch) -> Result<Card, StoreError> {
        self.write(StoreOp::UpdateCard, |d| d.update_card(id, patch))
    }

    async fn update_card_placements(&self, placements: &[CardPlacement]) -> Result<(), StoreError> {
        self.write(StoreOp::UpdateCardPlacements, |d| {
            d.update_card_placements(placements)
        })
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StoreError> {
        self.write(StoreOp::DeleteCard, |d| d.delete_card(id))
    }

    async fn delete_cards_in_column(&self, column_id: ColumnId) -> Result<(), StoreError> {
        self.write(StoreOp::DeleteCardsInColumn, |d| {
            d.delete_cards_in_column(column_id);
            Ok(())
        })
    }

    async fn list_tags(&self, board_id: BoardId) -> Result<Vec<Tag>, StoreError> {
        self.read(StoreOp::ListTags, |d| d.list_tags(board_id))
    }

    async fn insert_tag(&self, tag: NewTag) -> Result<Tag, StoreError> {
        self.write(StoreOp::InsertTag, |d| d.insert_tag(tag))
    }

    async fn delete_tag(&self, id: TagId) -> Result<(), StoreError> {
        self.write(StoreOp::DeleteTag, |d| d.delete_tag(id))
    }

    async fn card_tag_ids(&self, card_id: CardId) -> Result<Vec<TagId>, StoreError> {
        self.read(StoreOp::CardTagIds, |d| d.card_tag_ids(card_id))
    }

    async fn insert_card_tags(&self, pairs: &[CardTagAssociation]) -> Result<(), StoreError> {
        self.write(StoreOp::InsertCardTags, |d| d.insert_card_tags(pairs))
    }

    async fn delete_card_tags(&self, card_id: CardId) -> Result<(), StoreError> {
        self.write(StoreOp::DeleteCardTags, |d| {
            d.delete_card_tags(card_id);
            Ok(())
        })
    }

    async fn append_history(&self, entry: NewHistory) -> Result<CardHistory, StoreError> {
        self.write(StoreOp::AppendHistory, |d| Ok(d.append_history(entry)))
    }

    async fn list_history(&self, card_id: CardId) -> Result<Vec<CardHistory>, StoreError> {
        self.read(StoreOp::ListHistory, |d| d.list_history(card_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injected_failure_and_counting() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::InsertBoard);
        let result = store
            .insert_board(NewBoard {
                name: "Team".into(),
                expires_at: None,
            })
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.calls(StoreOp::InsertBoard), 1);
        assert!(store.dataset().boards.is_empty());

        store.clear_failures();
        store
            .insert_board(NewBoard {
                name: "Team".into(),
                expires_at: None,
            })
            .await
            .unwrap();
        assert_eq!(store.calls(StoreOp::InsertBoard), 2);
        assert_eq!(store.list_boards().await.unwrap().len(), 1);
    }
}
