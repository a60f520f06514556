/// Board synchronizer: full reload of columns, cards and tags.
///
/// Used for the initial load and as the recovery path whenever an
/// optimistic change and the store disagree. The fetched board replaces
/// local state in one swap, never a merge.
use std::sync::Arc;

use crate::state::LocalBoardState;
use crate::storage::{BoardStore, StoreError};
use crate::types::{is_backlog, BoardId, BoardSnapshot, ColumnView};

#[derive(Clone)]
pub struct BoardSynchronizer {
    store: Arc<dyn BoardStore>,
    state: Arc<LocalBoardState>,
}

impl BoardSynchronizer {
    pub fn new(store: Arc<dyn BoardStore>, state: Arc<LocalBoardState>) -> Self {
        Self { store, state }
    }

    /// Fetch the board without touching local state.
    /// Order: non-backlog columns by position, their cards (with tags) by
    /// position, board tags by name.
    pub async fn fetch(&self, board_id: BoardId) -> Result<BoardSnapshot, StoreError> {
        let mut columns: Vec<_> = self
            .store
            .list_columns(board_id)
            .await?
            .into_iter()
            .filter(|c| !is_backlog(&c.name))
            .collect();
        columns.sort_by_key(|c| c.position);
        let column_ids: Vec<_> = columns.iter().map(|c| c.id).collect();

        let mut cards = if column_ids.is_empty() {
            Vec::new()
        } else {
            self.store.list_cards(&column_ids).await?
        };
        cards.sort_by_key(|c| c.card.position);

        let mut tags = self.store.list_tags(board_id).await?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        let columns = columns
            .into_iter()
            .map(|column| ColumnView {
                cards: cards
                    .iter()
                    .filter(|c| c.card.column_id == column.id)
                    .cloned()
                    .collect(),
                column,
            })
            .collect();

        Ok(BoardSnapshot {
            board_id,
            columns,
            tags,
            version: 0,
        })
    }

    /// Reload the board and swap it into local state.
    pub async fn resync(&self) -> Result<(), StoreError> {
        let board_id = self.state.board_id();
        match self.fetch(board_id).await {
            Ok(snapshot) => {
                log::info!(
                    target: "taskboard.sync.resync",
                    "Board {} reloaded: {} columns, {} cards, {} tags",
                    board_id,
                    snapshot.columns.len(),
                    snapshot.card_count(),
                    snapshot.tags.len()
                );
                self.state.replace(snapshot);
                Ok(())
            }
            Err(e) => {
                log::error!(
                    target: "taskboard.sync.resync",
                    "Failed to reload board {}: {}",
                    board_id,
                    e
                );
                Err(e)
            }
        }
    }
}
