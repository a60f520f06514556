use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BoardId = Uuid;
pub type ColumnId = Uuid;
pub type CardId = Uuid;
pub type TagId = Uuid;

/// Reserved column name for the board's unordered intake list.
/// The backlog is kept out of the board view and fetched separately.
pub const BACKLOG_COLUMN: &str = "Backlog";

/// Position conventionally given to the backlog column.
pub const BACKLOG_POSITION: i64 = -1;

pub fn is_backlog(name: &str) -> bool {
    name == BACKLOG_COLUMN
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_password: bool,
}

impl Board {
    /// Expired boards stay in storage; callers decide whether to refuse access.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub column_id: ColumnId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub board_id: BoardId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Background and text colors used when rendering a tag chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStyle {
    pub background: String,
    pub text: String,
}

pub const TAG_DEFAULT_BACKGROUND: &str = "#e5e7eb";
pub const TAG_DEFAULT_TEXT: &str = "#1f2937";
pub const TAG_COLORED_TEXT: &str = "#ffffff";

impl Tag {
    pub fn style(&self) -> TagStyle {
        match self.color.as_deref().filter(|c| !c.is_empty()) {
            Some(color) => TagStyle {
                background: color.to_string(),
                text: TAG_COLORED_TEXT.to_string(),
            },
            None => TagStyle {
                background: TAG_DEFAULT_BACKGROUND.to_string(),
                text: TAG_DEFAULT_TEXT.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTagAssociation {
    pub card_id: CardId,
    pub tag_id: TagId,
}

/// Append-only record of a card moving between columns.
/// Column names are captured as displayed at the time of the move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHistory {
    pub id: Uuid,
    pub card_id: CardId,
    pub from_column: String,
    pub to_column: String,
    pub moved_at: DateTime<Utc>,
}

/// A card joined with its resolved tags, as read for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWithTags {
    #[serde(flatten)]
    pub card: Card,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl CardWithTags {
    pub fn id(&self) -> CardId {
        self.card.id
    }

    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// A column and its cards in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<CardWithTags>,
}

impl ColumnView {
    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards.iter().map(|c| c.card.id).collect()
    }

    pub fn index_of(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.card.id == card_id)
    }
}

/// Everything the board view renders: ordered non-backlog columns with
/// their cards, plus the board's tags sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board_id: BoardId,
    pub columns: Vec<ColumnView>,
    pub tags: Vec<Tag>,
    /// Monotonic counter bumped by every state transition.
    #[serde(default)]
    pub version: u64,
}

impl BoardSnapshot {
    pub fn empty(board_id: BoardId) -> Self {
        Self {
            board_id,
            columns: Vec::new(),
            tags: Vec::new(),
            version: 0,
        }
    }

    pub fn column(&self, column_id: ColumnId) -> Option<&ColumnView> {
        self.columns.iter().find(|c| c.column.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: ColumnId) -> Option<&mut ColumnView> {
        self.columns.iter_mut().find(|c| c.column.id == column_id)
    }

    /// Locate a card: (column index, card index).
    pub fn locate_card(&self, card_id: CardId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(ci, col)| {
            col.index_of(card_id).map(|idx| (ci, idx))
        })
    }

    pub fn card(&self, card_id: CardId) -> Option<&CardWithTags> {
        self.locate_card(card_id)
            .map(|(ci, idx)| &self.columns[ci].cards[idx])
    }

    pub fn tag(&self, tag_id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == tag_id)
    }

    /// Resolve tag ids against the board's tags, keeping name order.
    /// Unknown ids are skipped.
    pub fn resolve_tags(&self, tag_ids: &[TagId]) -> Vec<Tag> {
        self.tags
            .iter()
            .filter(|t| tag_ids.contains(&t.id))
            .cloned()
            .collect()
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }
}

/// Fields for a new board row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    pub name: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewColumn {
    pub board_id: BoardId,
    pub name: String,
    pub position: i64,
}

/// User-supplied card fields for create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

impl CardDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// User-supplied card fields for update. `tag_ids: None` leaves the
/// associations untouched; `Some` replaces them with exactly that set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEdit {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tag_ids: Option<Vec<TagId>>,
}

/// Row written by a card insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub column_id: ColumnId,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub position: i64,
}

/// Partial scalar update of a card row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Position-only update of one card: where it lives and where it sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlacement {
    pub id: CardId,
    pub column_id: ColumnId,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    pub board_id: BoardId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistory {
    pub card_id: CardId,
    pub from_column: String,
    pub to_column: String,
    pub moved_at: DateTime<Utc>,
}
