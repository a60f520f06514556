/// Engine settings shared by every front-end.
use serde::{Deserialize, Serialize};

use crate::history::UNKNOWN_COLUMN;
use crate::state::DEFAULT_EVENT_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Gap between consecutive card positions. 1 numbers cards 0, 1, 2, …;
    /// 1000 leaves room between them.
    #[serde(default = "default_position_stride")]
    pub position_stride: i64,
    /// Column name written to history when a column can no longer be resolved.
    #[serde(default = "default_unknown_column_label")]
    pub unknown_column_label: String,
    #[serde(default = "default_true")]
    pub record_history: bool,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_position_stride() -> i64 {
    1
}

fn default_unknown_column_label() -> String {
    UNKNOWN_COLUMN.to_string()
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            position_stride: default_position_stride(),
            unknown_column_label: default_unknown_column_label(),
            record_history: default_true(),
            event_capacity: default_event_capacity(),
        }
    }
}
