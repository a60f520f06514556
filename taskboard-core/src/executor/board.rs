//! Tag and column operations. None of these are optimistic: local state
//! follows the store once the write is accepted.

use super::MutationExecutor;
use crate::error::EngineError;
use crate::types::*;
use crate::validate;

impl MutationExecutor {
    pub async fn create_tag(&self, name: &str, color: Option<String>) -> Result<Tag, EngineError> {
        let name = validate::tag_name(name)?;
        validate::color(color.as_deref())?;

        let tag = self
            .store
            .insert_tag(NewTag {
                board_id: self.state.board_id(),
                name,
                color: validate::normalize_color(color),
            })
            .await
            .inspect_err(|e| {
                log::warn!(target: "taskboard.executor.tag", "Failed to create tag: {}", e);
            })?;

        self.state.commit(|snap| {
            snap.tags.push(tag.clone());
            snap.tags.sort_by(|a, b| a.name.cmp(&b.name));
        });
        Ok(tag)
    }

    /// Delete a tag board-wide; cards that carried it lose it.
    pub async fn delete_tag(&self, tag_id: TagId) -> Result<(), EngineError> {
        if self.state.read(|snap| snap.tag(tag_id).is_none()) {
            return Err(EngineError::TagNotFound(tag_id));
        }
        self.store.delete_tag(tag_id).await?;
        self.state.commit(|snap| {
            snap.tags.retain(|t| t.id != tag_id);
            for view in &mut snap.columns {
                for card in &mut view.cards {
                    card.tags.retain(|t| t.id != tag_id);
                }
            }
        });
        Ok(())
    }

    /// Append a column after the last one.
    pub async fn create_column(&self, name: &str) -> Result<Column, EngineError> {
        let name = validate::column_name(name)?;
        let position = self.state.read(|snap| {
            snap.columns
                .iter()
                .map(|c| c.column.position)
                .max()
                .map_or(0, |p| p + 1)
        });

        let column = self
            .store
            .insert_column(NewColumn {
                board_id: self.state.board_id(),
                name,
                position,
            })
            .await?;

        self.state.commit(|snap| {
            snap.columns.push(ColumnView {
                column: column.clone(),
                cards: Vec::new(),
            });
            snap.columns.sort_by_key(|c| c.column.position);
        });
        Ok(column)
    }

    pub async fn rename_column(
        &self,
        column_id: ColumnId,
        name: &str,
    ) -> Result<Column, EngineError> {
        let name = validate::column_name(name)?;
        if self.state.read(|snap| snap.column(column_id).is_none()) {
            return Err(EngineError::ColumnNotFound(column_id));
        }
        let column = self.store.rename_column(column_id, &name).await?;
        self.state.commit(|snap| {
            if let Some(view) = snap.column_mut(column_id) {
                view.column.name = column.name.clone();
            }
        });
        Ok(column)
    }

    /// Delete a column and everything in it: each card's tag associations,
    /// then the cards, then the column. If any step fails the board is
    /// reloaded, since part of the cascade may already have gone through.
    pub async fn delete_column(&self, column_id: ColumnId) -> Result<(), EngineError> {
        if self.state.read(|snap| snap.column(column_id).is_none()) {
            return Err(EngineError::ColumnNotFound(column_id));
        }

        if let Err(e) = self.cascade_delete_column(column_id).await {
            log::error!(
                target: "taskboard.executor.column",
                "Failed to delete column {}, resynchronizing: {}",
                column_id,
                e
            );
            let _ = self.sync.resync().await;
            return Err(e.into());
        }

        self.state
            .commit(|snap| snap.columns.retain(|c| c.column.id != column_id));
        Ok(())
    }

    async fn cascade_delete_column(
        &self,
        column_id: ColumnId,
    ) -> Result<(), crate::storage::StoreError> {
        let cards = self.store.list_cards(&[column_id]).await?;
        for card in &cards {
            if !card.tags.is_empty() {
                self.store.delete_card_tags(card.id()).await?;
            }
        }
        self.store.delete_cards_in_column(column_id).await?;
        self.store.delete_column(column_id).await
    }
}
