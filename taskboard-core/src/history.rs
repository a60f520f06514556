/// Audit trail for cross-column moves.
///
/// Recording is best-effort: by the time it runs the move has already been
/// persisted, so a failure here is logged and swallowed.
use std::sync::Arc;

use chrono::Utc;

use crate::storage::{self, BoardStore, StoreError};
use crate::types::{CardHistory, CardId, ColumnId, NewHistory};

pub const UNKNOWN_COLUMN: &str = "Unknown";

#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn BoardStore>,
    unknown_label: String,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self::with_unknown_label(store, UNKNOWN_COLUMN)
    }

    pub fn with_unknown_label(
        store: Arc<dyn BoardStore>,
        unknown_label: impl Into<String>,
    ) -> Self {
        Self {
            store,
            unknown_label: unknown_label.into(),
        }
    }

    /// Append a history record for a move. Never fails; returns the record
    /// when it was written.
    pub async fn record(
        &self,
        card_id: CardId,
        from_column: ColumnId,
        to_column: ColumnId,
    ) -> Option<CardHistory> {
        match self.try_record(card_id, from_column, to_column).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!(
                    target: "taskboard.history.record",
                    "Failed to record move of card {} ({} -> {}): {}",
                    card_id,
                    from_column,
                    to_column,
                    e
                );
                None
            }
        }
    }

    async fn try_record(
        &self,
        card_id: CardId,
        from_column: ColumnId,
        to_column: ColumnId,
    ) -> Result<CardHistory, StoreError> {
        let names = storage::column_names(self.store.as_ref(), &[from_column, to_column])
            .await?;
        let name_of = |id: ColumnId| {
            names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| self.unknown_label.clone())
        };
        self.store
            .append_history(NewHistory {
                card_id,
                from_column: name_of(from_column),
                to_column: name_of(to_column),
                moved_at: Utc::now(),
            })
            .await
    }

    pub async fn list(&self, card_id: CardId) -> Result<Vec<CardHistory>, StoreError> {
        self.store.list_history(card_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryStore, StoreOp};
    use crate::types::{NewBoard, NewColumn};
    use uuid::Uuid;

    async fn two_columns(store: &MemoryStore) -> (ColumnId, ColumnId) {
        let board = store
            .insert_board(NewBoard {
                name: "Team".into(),
                expires_at: None,
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for (i, name) in ["To Do", "Done"].iter().enumerate() {
            let col = store
                .insert_column(NewColumn {
                    board_id: board.id,
                    name: name.to_string(),
                    position: i as i64,
                })
                .await
                .unwrap();
            ids.push(col.id);
        }
        (ids[0], ids[1])
    }

    #[tokio::test]
    async fn test_records_display_names_in_one_lookup() {
        let store = Arc::new(MemoryStore::new());
        let (todo, done) = two_columns(&store).await;
        let recorder = HistoryRecorder::new(store.clone());
        let card = Uuid::new_v4();

        let entry = recorder.record(card, todo, done).await.unwrap();
        assert_eq!(entry.from_column, "To Do");
        assert_eq!(entry.to_column, "Done");
        assert_eq!(store.calls(StoreOp::FetchColumns), 1);
        assert_eq!(recorder.list(card).await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn test_unresolved_name_uses_placeholder() {
        let store = Arc::new(MemoryStore::new());
        let (todo, _) = two_columns(&store).await;
        let recorder = HistoryRecorder::with_unknown_label(store.clone(), "???");

        let entry = recorder
            .record(Uuid::new_v4(), todo, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(entry.from_column, "To Do");
        assert_eq!(entry.to_column, "???");
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        let (todo, done) = two_columns(&store).await;
        store.fail_on(StoreOp::AppendHistory);
        let recorder = HistoryRecorder::new(store.clone());

        assert!(recorder.record(Uuid::new_v4(), todo, done).await.is_none());
    }
}
