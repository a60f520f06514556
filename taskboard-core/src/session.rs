/// One open board: owns its local state and the executor that mutates it.
///
/// This is the surface UI and command front-ends talk to. Reads come from
/// the local snapshot; every change goes through the executor.
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::executor::MutationExecutor;
use crate::state::{BoardEvent, LocalBoardState};
use crate::storage::BoardStore;
use crate::types::*;

pub struct BoardSession {
    board: Board,
    store: Arc<dyn BoardStore>,
    state: Arc<LocalBoardState>,
    executor: MutationExecutor,
}

impl BoardSession {
    /// Load a board and its current contents.
    pub async fn open(
        store: Arc<dyn BoardStore>,
        board_id: BoardId,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let board = store
            .fetch_board(board_id)
            .await?
            .ok_or(EngineError::BoardNotFound(board_id))?;
        let capacity = config.event_capacity;
        let state = Arc::new(LocalBoardState::with_capacity(board_id, capacity));
        let executor = MutationExecutor::new(store.clone(), state.clone(), config);
        executor.synchronizer().resync().await?;
        log::info!(
            target: "taskboard.session.open",
            "Opened board {:?} ({})",
            board.name,
            board_id
        );
        Ok(Self {
            board,
            store,
            state,
            executor,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.state.subscribe()
    }

    /// Discard local state and reload from the store.
    pub async fn resync(&self) -> Result<(), EngineError> {
        Ok(self.executor.synchronizer().resync().await?)
    }

    pub async fn add_card(
        &self,
        column_id: ColumnId,
        draft: CardDraft,
    ) -> Result<CardWithTags, EngineError> {
        self.executor.add_card(column_id, draft).await
    }

    pub async fn update_card(
        &self,
        card_id: CardId,
        edit: CardEdit,
    ) -> Result<CardWithTags, EngineError> {
        self.executor.update_card(card_id, edit).await
    }

    pub async fn delete_card(&self, card_id: CardId) -> Result<(), EngineError> {
        self.executor.delete_card(card_id).await
    }

    pub async fn reorder_card(
        &self,
        column_id: ColumnId,
        card_id: CardId,
        from_index: usize,
        to_index: usize,
    ) -> Result<(), EngineError> {
        self.executor
            .reorder_card(column_id, card_id, from_index, to_index)
            .await
    }

    pub async fn move_card(
        &self,
        card_id: CardId,
        source_column_id: ColumnId,
        dest_column_id: ColumnId,
        to_index: usize,
    ) -> Result<Option<CardHistory>, EngineError> {
        self.executor
            .move_card(card_id, source_column_id, dest_column_id, to_index)
            .await
    }

    pub async fn create_tag(&self, name: &str, color: Option<String>) -> Result<Tag, EngineError> {
        self.executor.create_tag(name, color).await
    }

    pub async fn delete_tag(&self, tag_id: TagId) -> Result<(), EngineError> {
        self.executor.delete_tag(tag_id).await
    }

    pub async fn create_column(&self, name: &str) -> Result<Column, EngineError> {
        self.executor.create_column(name).await
    }

    pub async fn rename_column(
        &self,
        column_id: ColumnId,
        name: &str,
    ) -> Result<Column, EngineError> {
        self.executor.rename_column(column_id, name).await
    }

    pub async fn delete_column(&self, column_id: ColumnId) -> Result<(), EngineError> {
        self.executor.delete_column(column_id).await
    }

    /// First card whose title matches, ignoring case and surrounding space.
    pub fn find_card_by_title(&self, title: &str) -> Option<CardWithTags> {
        let wanted = title.trim().to_lowercase();
        self.state.read(|snap| {
            snap.columns
                .iter()
                .flat_map(|c| c.cards.iter())
                .find(|c| c.card.title.trim().to_lowercase() == wanted)
                .cloned()
        })
    }

    /// Column by name, ignoring case.
    pub fn find_column_by_name(&self, name: &str) -> Option<Column> {
        let wanted = name.trim().to_lowercase();
        self.state.read(|snap| {
            snap.columns
                .iter()
                .find(|c| c.column.name.to_lowercase() == wanted)
                .map(|c| c.column.clone())
        })
    }

    /// The board's backlog with its cards, creating the column on first use.
    pub async fn backlog(&self) -> Result<ColumnView, EngineError> {
        let existing = self
            .store
            .list_columns(self.board.id)
            .await?
            .into_iter()
            .find(|c| is_backlog(&c.name));
        let column = match existing {
            Some(column) => column,
            None => {
                log::info!(
                    target: "taskboard.session.backlog",
                    "Creating backlog for board {}",
                    self.board.id
                );
                self.store
                    .insert_column(NewColumn {
                        board_id: self.board.id,
                        name: BACKLOG_COLUMN.to_string(),
                        position: BACKLOG_POSITION,
                    })
                    .await?
            }
        };
        let cards = self.store.list_cards(&[column.id]).await?;
        Ok(ColumnView { column, cards })
    }

    pub async fn card_history(&self, card_id: CardId) -> Result<Vec<CardHistory>, EngineError> {
        Ok(self.store.list_history(card_id).await?)
    }
}
