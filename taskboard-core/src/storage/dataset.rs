/// Row collections shared by the in-memory and file-backed stores.
///
/// Each method is one logical write: it validates everything it touches
/// before changing anything, so a failed call leaves the dataset as it was.
use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StoreError;
use crate::types::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub card_tags: Vec<CardTagAssociation>,
    #[serde(default)]
    pub history: Vec<CardHistory>,
}

impl Dataset {
    pub fn list_boards(&self) -> Vec<Board> {
        let mut boards = self.boards.clone();
        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        boards
    }

    pub fn fetch_board(&self, board_id: BoardId) -> Option<Board> {
        self.boards.iter().find(|b| b.id == board_id).cloned()
    }

    pub fn insert_board(&mut self, new: NewBoard) -> Board {
        let board = Board {
            id: Uuid::new_v4(),
            name: new.name,
            created_at: Utc::now(),
            expires_at: new.expires_at,
            has_password: false,
        };
        self.boards.push(board.clone());
        board
    }

    pub fn list_columns(&self, board_id: BoardId) -> Vec<Column> {
        let mut columns: Vec<Column> = self
            .columns
            .iter()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        columns.sort_by_key(|c| c.position);
        columns
    }

    pub fn fetch_columns(&self, ids: &[ColumnId]) -> Vec<Column> {
        self.columns
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect()
    }

    pub fn insert_column(&mut self, new: NewColumn) -> Result<Column, StoreError> {
        if !self.boards.iter().any(|b| b.id == new.board_id) {
            return Err(StoreError::not_found("board", new.board_id));
        }
        let column = Column {
            id: Uuid::new_v4(),
            board_id: new.board_id,
            name: new.name,
            position: new.position,
            created_at: Utc::now(),
        };
        self.columns.push(column.clone());
        Ok(column)
    }

    pub fn rename_column(&mut self, id: ColumnId, name: &str) -> Result<Column, StoreError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("column", id))?;
        column.name = name.to_string();
        Ok(column.clone())
    }

    /// Refuses while the column still holds cards; callers delete those first.
    pub fn delete_column(&mut self, id: ColumnId) -> Result<(), StoreError> {
        if self.cards.iter().any(|c| c.column_id == id) {
            return Err(StoreError::Rejected(format!("column {} still has cards", id)));
        }
        self.columns.retain(|c| c.id != id);
        Ok(())
    }

    fn tags_for(&self, card_id: CardId) -> Vec<Tag> {
        let ids: HashSet<TagId> = self
            .card_tags
            .iter()
            .filter(|a| a.card_id == card_id)
            .map(|a| a.tag_id)
            .collect();
        let mut tags: Vec<Tag> = self
            .tags
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    pub fn list_cards(&self, column_ids: &[ColumnId]) -> Vec<CardWithTags> {
        let mut cards: Vec<&Card> = self
            .cards
            .iter()
            .filter(|c| column_ids.contains(&c.column_id))
            .collect();
        cards.sort_by_key(|c| c.position);
        cards
            .into_iter()
            .map(|card| CardWithTags {
                card: card.clone(),
                tags: self.tags_for(card.id),
            })
            .collect()
    }

    pub fn insert_card(&mut self, new: NewCard) -> Result<Card, StoreError> {
        if !self.columns.iter().any(|c| c.id == new.column_id) {
            return Err(StoreError::not_found("column", new.column_id));
        }
        let card = Card {
            id: Uuid::new_v4(),
            column_id: new.column_id,
            title: new.title,
            description: new.description,
            color: new.color,
            due_date: new.due_date,
            position: new.position,
            created_at: Utc::now(),
        };
        self.cards.push(card.clone());
        Ok(card)
    }

    pub fn update_card(&mut self, id: CardId, patch: CardPatch) -> Result<Card, StoreError> {
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("card", id))?;
        card.title = patch.title;
        card.description = patch.description;
        card.color = patch.color;
        card.due_date = patch.due_date;
        Ok(card.clone())
    }

    pub fn update_card_placements(
        &mut self,
        placements: &[CardPlacement],
    ) -> Result<(), StoreError> {
        for p in placements {
            if !self.cards.iter().any(|c| c.id == p.id) {
                return Err(StoreError::not_found("card", p.id));
            }
            if !self.columns.iter().any(|c| c.id == p.column_id) {
                return Err(StoreError::not_found("column", p.column_id));
            }
        }
        for p in placements {
            if let Some(card) = self.cards.iter_mut().find(|c| c.id == p.id) {
                card.column_id = p.column_id;
                card.position = p.position;
            }
        }
        Ok(())
    }

    pub fn delete_card(&mut self, id: CardId) -> Result<(), StoreError> {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        if self.cards.len() == before {
            return Err(StoreError::not_found("card", id));
        }
        self.card_tags.retain(|a| a.card_id != id);
        Ok(())
    }

    pub fn delete_cards_in_column(&mut self, column_id: ColumnId) {
        let removed: HashSet<CardId> = self
            .cards
            .iter()
            .filter(|c| c.column_id == column_id)
            .map(|c| c.id)
            .collect();
        self.cards.retain(|c| c.column_id != column_id);
        self.card_tags.retain(|a| !removed.contains(&a.card_id));
    }

    pub fn list_tags(&self, board_id: BoardId) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .tags
            .iter()
            .filter(|t| t.board_id == board_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    pub fn insert_tag(&mut self, new: NewTag) -> Result<Tag, StoreError> {
        if !self.boards.iter().any(|b| b.id == new.board_id) {
            return Err(StoreError::not_found("board", new.board_id));
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            board_id: new.board_id,
            name: new.name,
            color: new.color,
        };
        self.tags.push(tag.clone());
        Ok(tag)
    }

    pub fn delete_tag(&mut self, id: TagId) -> Result<(), StoreError> {
        let before = self.tags.len();
        self.tags.retain(|t| t.id != id);
        if self.tags.len() == before {
            return Err(StoreError::not_found("tag", id));
        }
        self.card_tags.retain(|a| a.tag_id != id);
        Ok(())
    }

    pub fn card_tag_ids(&self, card_id: CardId) -> Vec<TagId> {
        self.card_tags
            .iter()
            .filter(|a| a.card_id == card_id)
            .map(|a| a.tag_id)
            .collect()
    }

    /// Duplicate pairs are ignored; the pair is the row's identity.
    pub fn insert_card_tags(&mut self, pairs: &[CardTagAssociation]) -> Result<(), StoreError> {
        for pair in pairs {
            if !self.cards.iter().any(|c| c.id == pair.card_id) {
                return Err(StoreError::not_found("card", pair.card_id));
            }
            if !self.tags.iter().any(|t| t.id == pair.tag_id) {
                return Err(StoreError::not_found("tag", pair.tag_id));
            }
        }
        for pair in pairs {
            if !self.card_tags.contains(pair) {
                self.card_tags.push(*pair);
            }
        }
        Ok(())
    }

    pub fn delete_card_tags(&mut self, card_id: CardId) {
        self.card_tags.retain(|a| a.card_id != card_id);
    }

    pub fn append_history(&mut self, entry: NewHistory) -> CardHistory {
        let record = CardHistory {
            id: Uuid::new_v4(),
            card_id: entry.card_id,
            from_column: entry.from_column,
            to_column: entry.to_column,
            moved_at: entry.moved_at,
        };
        self.history.push(record.clone());
        record
    }

    pub fn list_history(&self, card_id: CardId) -> Vec<CardHistory> {
        let mut records: Vec<CardHistory> = self
            .history
            .iter()
            .filter(|h| h.card_id == card_id)
            .cloned()
            .collect();
        records.sort_by_key(|h| h.moved_at);
        records
    }
}
