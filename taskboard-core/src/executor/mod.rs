/// Mutation executor: the only writer of local board state besides the
/// synchronizer's wholesale replace.
///
/// Failure handling differs per operation:
/// - reorder / move apply optimistically; a failed write rolls back and
///   resyncs so the board snaps back to what the store holds
/// - add waits for the persisted row before showing the card
/// - update changes local state only after the write succeeds
/// - delete removes optimistically and is not rolled back on failure
/// Secondary steps (tag reconciliation, history) never undo the primary one.
mod board;
mod layout;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::history::HistoryRecorder;
use crate::position::{reinsert, PositionAllocator};
use crate::state::{Checkpoint, LocalBoardState};
use crate::storage::{BoardStore, StoreError};
use crate::sync::BoardSynchronizer;
use crate::tags::TagReconciler;
use crate::types::*;
use crate::validate;

pub struct MutationExecutor {
    store: Arc<dyn BoardStore>,
    state: Arc<LocalBoardState>,
    allocator: PositionAllocator,
    tags: TagReconciler,
    history: Option<HistoryRecorder>,
    sync: BoardSynchronizer,
}

impl MutationExecutor {
    pub fn new(
        store: Arc<dyn BoardStore>,
        state: Arc<LocalBoardState>,
        config: &EngineConfig,
    ) -> Self {
        let history = config.record_history.then(|| {
            HistoryRecorder::with_unknown_label(store.clone(), config.unknown_column_label.clone())
        });
        Self {
            allocator: PositionAllocator::new(config.position_stride),
            tags: TagReconciler::new(store.clone()),
            sync: BoardSynchronizer::new(store.clone(), state.clone()),
            history,
            store,
            state,
        }
    }

    pub fn state(&self) -> &Arc<LocalBoardState> {
        &self.state
    }

    pub fn synchronizer(&self) -> &BoardSynchronizer {
        &self.sync
    }

    /// Undo an optimistic change after its write failed, then reload the
    /// board from the store.
    async fn recover(&self, checkpoint: Checkpoint, op: &str, err: StoreError) -> EngineError {
        log::error!(
            target: "taskboard.executor.recover",
            "{} failed, resynchronizing: {}",
            op,
            err
        );
        if !self.state.rollback(checkpoint) {
            log::debug!(
                target: "taskboard.executor.recover",
                "{}: state changed since the optimistic apply, relying on resync",
                op
            );
        }
        // resync logs its own failure; the rolled back state stands meanwhile
        let _ = self.sync.resync().await;
        EngineError::Persistence(err)
    }

    /// Move a card to `to_index` within its column and renumber the column.
    /// `from_index` is what the caller saw; the card's actual slot wins.
    pub async fn reorder_card(
        &self,
        column_id: ColumnId,
        card_id: CardId,
        from_index: usize,
        to_index: usize,
    ) -> Result<(), EngineError> {
        let ordered = self.state.read(|snap| {
            let column = snap
                .column(column_id)
                .ok_or(EngineError::ColumnNotFound(column_id))?;
            match column.index_of(card_id) {
                Some(actual) => {
                    if actual != from_index {
                        log::debug!(
                            target: "taskboard.executor.reorder",
                            "card {} expected at {}, found at {}",
                            card_id,
                            from_index,
                            actual
                        );
                    }
                    Ok(column.card_ids())
                }
                None => Err(EngineError::CardNotFound(card_id)),
            }
        })?;

        let placements: Vec<CardPlacement> = self
            .allocator
            .allocate(&ordered, card_id, to_index)
            .into_iter()
            .map(|(id, position)| CardPlacement {
                id,
                column_id,
                position,
            })
            .collect();
        if self.state.read(|snap| layout::is_noop(snap, &placements)) {
            return Ok(());
        }
        log::debug!(
            target: "taskboard.executor.reorder",
            "column {}: {} placements",
            column_id,
            placements.len()
        );

        let checkpoint = self
            .state
            .apply_optimistic(|snap| layout::apply_placements(snap, &placements));
        match self.store.update_card_placements(&placements).await {
            Ok(()) => {
                self.state.confirm(checkpoint);
                Ok(())
            }
            Err(e) => Err(self.recover(checkpoint, "reorder", e).await),
        }
    }

    /// Move a card into another column at `to_index`, renumbering both
    /// columns from 0. Returns the history record if one was written.
    pub async fn move_card(
        &self,
        card_id: CardId,
        source_column_id: ColumnId,
        dest_column_id: ColumnId,
        to_index: usize,
    ) -> Result<Option<CardHistory>, EngineError> {
        if source_column_id == dest_column_id {
            let from = self
                .state
                .read(|snap| {
                    snap.column(source_column_id)
                        .and_then(|c| c.index_of(card_id))
                })
                .unwrap_or(0);
            return self
                .reorder_card(source_column_id, card_id, from, to_index)
                .await
                .map(|()| None);
        }

        let (source, dest) = self.state.read(|snap| {
            let source = snap
                .column(source_column_id)
                .ok_or(EngineError::ColumnNotFound(source_column_id))?;
            let dest = snap
                .column(dest_column_id)
                .ok_or(EngineError::ColumnNotFound(dest_column_id))?;
            if source.index_of(card_id).is_none() {
                return Err(EngineError::CardNotFound(card_id));
            }
            Ok((source.card_ids(), dest.card_ids()))
        })?;

        let remaining: Vec<CardId> = source.into_iter().filter(|id| *id != card_id).collect();
        let mut placements = self.allocator.placements(source_column_id, &remaining);
        placements.extend(
            self.allocator
                .placements(dest_column_id, &reinsert(&dest, card_id, to_index)),
        );
        log::debug!(
            target: "taskboard.executor.move",
            "card {}: {} -> {} at {} ({} placements)",
            card_id,
            source_column_id,
            dest_column_id,
            to_index,
            placements.len()
        );

        // Both columns change in one transition so no render sees a half-moved card
        let checkpoint = self
            .state
            .apply_optimistic(|snap| layout::apply_placements(snap, &placements));
        if let Err(e) = self.store.update_card_placements(&placements).await {
            return Err(self.recover(checkpoint, "move", e).await);
        }
        self.state.confirm(checkpoint);

        Ok(match &self.history {
            Some(history) => {
                history
                    .record(card_id, source_column_id, dest_column_id)
                    .await
            }
            None => None,
        })
    }

    /// Create a card at the end of `column_id`. Nothing is shown until the
    /// store returns the row.
    pub async fn add_card(
        &self,
        column_id: ColumnId,
        draft: CardDraft,
    ) -> Result<CardWithTags, EngineError> {
        let title = validate::draft(&draft).inspect_err(|e| {
            log::warn!(target: "taskboard.executor.add", "Rejected card: {}", e);
        })?;

        let in_view = self
            .state
            .read(|snap| snap.column(column_id).map(|c| c.cards.len()));
        let count = match in_view {
            Some(count) => count,
            None => self.offscreen_card_count(column_id).await?,
        };

        let card = self
            .store
            .insert_card(NewCard {
                column_id,
                title,
                description: draft.description,
                color: validate::normalize_color(draft.color),
                due_date: draft.due_date,
                position: self.allocator.position_at(count),
            })
            .await
            .inspect_err(|e| {
                log::warn!(target: "taskboard.executor.add", "Failed to create card: {}", e);
            })?;

        let tags = if draft.tag_ids.is_empty() {
            Vec::new()
        } else {
            match self.tags.reconcile(card.id, &[], &draft.tag_ids).await {
                Ok(_) => self.state.read(|snap| snap.resolve_tags(&draft.tag_ids)),
                Err(e) => {
                    log::warn!(
                        target: "taskboard.executor.add",
                        "Card {} created but tags not saved: {}",
                        card.id,
                        e
                    );
                    Vec::new()
                }
            }
        };

        let created = CardWithTags { card, tags };
        self.state.commit(|snap| {
            if let Some(view) = snap.column_mut(column_id) {
                view.cards.push(created.clone());
                view.cards.sort_by_key(|c| c.card.position);
            }
        });
        Ok(created)
    }

    /// Card count of a column that is not in the board view. Only this
    /// board's backlog qualifies; anything else is unknown here.
    async fn offscreen_card_count(&self, column_id: ColumnId) -> Result<usize, EngineError> {
        let board_id = self.state.board_id();
        let owned = self
            .store
            .fetch_columns(&[column_id])
            .await?
            .into_iter()
            .any(|c| c.board_id == board_id && is_backlog(&c.name));
        if !owned {
            log::warn!(
                target: "taskboard.executor.add",
                "Column {} is not on board {}",
                column_id,
                board_id
            );
            return Err(EngineError::ColumnNotFound(column_id));
        }
        Ok(self.store.list_cards(&[column_id]).await?.len())
    }

    /// Save scalar fields, then (if given) replace the tag set. Local state
    /// changes only after the scalar write succeeds.
    pub async fn update_card(
        &self,
        card_id: CardId,
        edit: CardEdit,
    ) -> Result<CardWithTags, EngineError> {
        let title = validate::edit(&edit).inspect_err(|e| {
            log::warn!(target: "taskboard.executor.update", "Rejected edit of {}: {}", card_id, e);
        })?;

        let card = self
            .store
            .update_card(
                card_id,
                CardPatch {
                    title,
                    description: edit.description,
                    color: validate::normalize_color(edit.color),
                    due_date: edit.due_date,
                },
            )
            .await
            .inspect_err(|e| {
                log::warn!(
                    target: "taskboard.executor.update",
                    "Card {} not saved: {}",
                    card_id,
                    e
                );
            })?;

        let new_tags = match edit.tag_ids {
            Some(desired) => match self.tags.replace(card_id, &desired).await {
                Ok(delta) => {
                    log::debug!(
                        target: "taskboard.executor.update",
                        "card {} tags: +{:?} -{:?}",
                        card_id,
                        delta.added,
                        delta.removed
                    );
                    Some(self.state.read(|snap| snap.resolve_tags(&desired)))
                }
                Err(e) => {
                    log::warn!(
                        target: "taskboard.executor.update",
                        "Card {} saved but tags not saved: {}",
                        card_id,
                        e
                    );
                    None
                }
            },
            None => None,
        };

        let updated = self.state.commit(|snap| {
            let (ci, idx) = snap.locate_card(card_id)?;
            let entry = &mut snap.columns[ci].cards[idx];
            entry.card.title = card.title.clone();
            entry.card.description = card.description.clone();
            entry.card.color = card.color.clone();
            entry.card.due_date = card.due_date;
            if let Some(tags) = &new_tags {
                entry.tags = tags.clone();
            }
            Some(entry.clone())
        });

        match updated {
            Some(entry) => Ok(entry),
            None => {
                // Card outside the board view (backlog): tags come from the store
                let tags = match new_tags {
                    Some(tags) => tags,
                    None => self
                        .store
                        .list_cards(&[card.column_id])
                        .await?
                        .into_iter()
                        .find(|c| c.card.id == card_id)
                        .map(|c| c.tags)
                        .unwrap_or_default(),
                };
                Ok(CardWithTags { card, tags })
            }
        }
    }

    /// Remove a card from the board right away, then delete it and its tag
    /// associations. A failed delete is reported but the card stays hidden
    /// until the next full load.
    pub async fn delete_card(&self, card_id: CardId) -> Result<(), EngineError> {
        let checkpoint = self.state.apply_optimistic(|snap| {
            if let Some((ci, idx)) = snap.locate_card(card_id) {
                snap.columns[ci].cards.remove(idx);
            }
        });
        self.state.confirm(checkpoint);

        let result = match self.store.delete_card_tags(card_id).await {
            Ok(()) => self.store.delete_card(card_id).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| {
            log::warn!(
                target: "taskboard.executor.delete",
                "Card {} removed locally but delete failed: {}",
                card_id,
                e
            );
            EngineError::Persistence(e)
        })
    }
}
